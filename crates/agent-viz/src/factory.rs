//! Entity factory: agent record → renderable robot.
//!
//! Construction is split in two. [`build_template`] is a pure function that
//! validates the record and resolves its variant to a fixed visual style.
//! [`spawn_renderable`] turns a template into the entity hierarchy.

use agent_roster::{Agent, AgentId, AgentVariant};
use bevy::prelude::*;
use bevy::render::render_resource::Face;

use crate::animation::{Effects, THOUGHT_HEIGHT};
use crate::picking::HitVolume;
use crate::reconcile::{Renderable, RenderableRig};

/// Height of a robot's root above its anchor.
pub const BASE_HEIGHT: f32 = 1.3;
/// Half extents of the invisible hover box.
pub const HIT_HALF_EXTENTS: Vec3 = Vec3::new(0.5, 1.0, 0.5);
/// Offset of the hover box center from the root.
pub const HIT_OFFSET: Vec3 = Vec3::new(0.0, 0.4, 0.0);

/// Reasons a record cannot become a renderable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("agent record has an empty id")]
    EmptyId,
    #[error("agent {id} has a non-finite anchor position {position:?}")]
    NonFiniteAnchor { id: AgentId, position: [f32; 3] },
    #[error("agent {id} has an invalid display color '{color}'")]
    InvalidColor { id: AgentId, color: String },
}

/// Eye shape for a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeStyle {
    Sleepy,
    Happy,
    Glitch,
    Standard,
}

/// Fixed look of one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantStyle {
    pub body: Srgba,
    /// Accent color; `None` borrows the agent's display color.
    pub accent: Option<Srgba>,
    pub eyes: EyeStyle,
}

/// Resolve a variant to its style.
pub fn variant_style(variant: AgentVariant) -> VariantStyle {
    match variant {
        AgentVariant::Sleepy => VariantStyle {
            body: Srgba::rgb_u8(0xA8, 0xD8, 0xF0),
            accent: Some(Srgba::rgb_u8(0x6B, 0xA8, 0xCC)),
            eyes: EyeStyle::Sleepy,
        },
        AgentVariant::Joy => VariantStyle {
            body: Srgba::rgb_u8(0xB8, 0xE6, 0xA8),
            accent: Some(Srgba::rgb_u8(0x88, 0xC8, 0x78)),
            eyes: EyeStyle::Happy,
        },
        AgentVariant::Glitch => VariantStyle {
            body: Srgba::rgb_u8(0xFF, 0xB8, 0xC8),
            accent: Some(Srgba::rgb_u8(0xFF, 0x8F, 0xA8)),
            eyes: EyeStyle::Glitch,
        },
        AgentVariant::New | AgentVariant::Unknown => VariantStyle {
            body: Srgba::rgb_u8(0xD8, 0xCC, 0xF5),
            accent: None,
            eyes: EyeStyle::Standard,
        },
    }
}

/// Everything needed to spawn one renderable.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableTemplate {
    pub agent_id: AgentId,
    pub variant: AgentVariant,
    /// Rest position of the root.
    pub base: Vec3,
    pub body: Srgba,
    pub accent: Srgba,
    pub display: Srgba,
    pub eyes: EyeStyle,
    pub hit: HitVolume,
}

/// Validate a record and resolve its template.
pub fn build_template(agent: &Agent) -> Result<RenderableTemplate, FactoryError> {
    if agent.id.trim().is_empty() {
        return Err(FactoryError::EmptyId);
    }
    if agent.anchor_position.iter().any(|c| !c.is_finite()) {
        return Err(FactoryError::NonFiniteAnchor {
            id: agent.id.clone(),
            position: agent.anchor_position,
        });
    }
    let display = Srgba::hex(&agent.display_color).map_err(|_| FactoryError::InvalidColor {
        id: agent.id.clone(),
        color: agent.display_color.clone(),
    })?;

    let style = variant_style(agent.variant);
    let [x, _, z] = agent.anchor_position;

    Ok(RenderableTemplate {
        agent_id: agent.id.clone(),
        variant: agent.variant,
        base: Vec3::new(x, BASE_HEIGHT, z),
        body: style.body,
        accent: style.accent.unwrap_or(display),
        display,
        eyes: style.eyes,
        hit: HitVolume {
            agent_id: agent.id.clone(),
            half_extents: HIT_HALF_EXTENTS,
            offset: HIT_OFFSET,
        },
    })
}

/// Spawn the entity hierarchy for a template and return the root.
pub fn spawn_renderable(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    template: RenderableTemplate,
    phase: f32,
) -> Entity {
    let body_material = materials.add(StandardMaterial {
        base_color: Color::Srgba(template.body),
        metallic: 0.3,
        perceptual_roughness: 0.4,
        ..default()
    });
    let head_material = materials.add(StandardMaterial {
        base_color: Color::Srgba(template.body),
        metallic: 0.3,
        perceptual_roughness: 0.4,
        emissive: LinearRgba::BLACK,
        ..default()
    });
    let accent_material = materials.add(StandardMaterial {
        base_color: Color::Srgba(template.accent),
        metallic: 0.4,
        perceptual_roughness: 0.5,
        ..default()
    });
    let eye_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.12, 0.12, 0.16),
        perceptual_roughness: 0.2,
        ..default()
    });
    let cloud_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 0.98, 0.8, 0.8),
        alpha_mode: AlphaMode::Blend,
        metallic: 0.1,
        perceptual_roughness: 0.9,
        ..default()
    });
    let glow_material = materials.add(StandardMaterial {
        base_color: Color::Srgba(Srgba {
            alpha: 0.0,
            ..template.accent
        }),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        cull_mode: Some(Face::Front),
        ..default()
    });

    let mut thought = Entity::PLACEHOLDER;
    let mut glow = Entity::PLACEHOLDER;

    let root = commands
        .spawn((
            SpatialBundle::from_transform(Transform::from_translation(template.base)),
            Name::new(format!("agent:{}", template.agent_id)),
            template.hit.clone(),
        ))
        .with_children(|parent| {
            parent.spawn(PbrBundle {
                mesh: meshes.add(Capsule3d::new(0.18, 0.25)),
                material: body_material.clone(),
                transform: Transform::from_xyz(0.0, 0.25, 0.0),
                ..default()
            });
            parent.spawn(PbrBundle {
                mesh: meshes.add(Sphere::new(0.22)),
                material: head_material.clone(),
                transform: Transform::from_xyz(0.0, 0.68, 0.0),
                ..default()
            });

            let eye_mesh = meshes.add(Sphere::new(0.04));
            for (side, scale) in eye_layout(template.eyes) {
                parent.spawn(PbrBundle {
                    mesh: eye_mesh.clone(),
                    material: eye_material.clone(),
                    transform: Transform::from_xyz(side * 0.08, 0.7, 0.19).with_scale(scale),
                    ..default()
                });
            }

            parent.spawn(PbrBundle {
                mesh: meshes.add(Cylinder::new(0.015, 0.2)),
                material: accent_material.clone(),
                transform: Transform::from_xyz(0.0, 0.95, 0.0),
                ..default()
            });
            parent.spawn(PbrBundle {
                mesh: meshes.add(Sphere::new(0.04)),
                material: accent_material.clone(),
                transform: Transform::from_xyz(0.0, 1.06, 0.0),
                ..default()
            });

            thought = parent
                .spawn((
                    SpatialBundle {
                        transform: Transform::from_xyz(0.0, THOUGHT_HEIGHT, 0.0),
                        visibility: Visibility::Hidden,
                        ..default()
                    },
                    Name::new("thought"),
                ))
                .with_children(|cloud| {
                    let puffs = [
                        (0.15, Vec3::ZERO, Vec3::new(1.0, 0.8, 1.0)),
                        (0.08, Vec3::new(-0.12, -0.1, 0.0), Vec3::new(1.0, 0.7, 1.0)),
                        (0.05, Vec3::new(-0.18, -0.18, 0.0), Vec3::new(1.0, 0.6, 1.0)),
                    ];
                    for (radius, offset, scale) in puffs {
                        cloud.spawn(PbrBundle {
                            mesh: meshes.add(Sphere::new(radius)),
                            material: cloud_material.clone(),
                            transform: Transform::from_translation(offset).with_scale(scale),
                            ..default()
                        });
                    }
                })
                .id();

            glow = parent
                .spawn((
                    PbrBundle {
                        mesh: meshes.add(Sphere::new(0.5)),
                        material: glow_material.clone(),
                        transform: Transform::from_xyz(0.0, 0.5, 0.0),
                        visibility: Visibility::Hidden,
                        ..default()
                    },
                    Name::new("glow"),
                ))
                .id();
        })
        .id();

    commands.entity(root).insert((
        Renderable::new(
            template.agent_id,
            template.variant,
            template.base,
            phase,
            RenderableRig {
                thought,
                glow,
                head_material,
                glow_material,
                accent: template.accent,
                display: template.display,
            },
        ),
        Effects::default(),
    ));

    root
}

/// Eye placement as `(side, scale)` pairs.
fn eye_layout(style: EyeStyle) -> [(f32, Vec3); 2] {
    match style {
        EyeStyle::Sleepy => [(-1.0, Vec3::new(1.2, 0.3, 1.0)), (1.0, Vec3::new(1.2, 0.3, 1.0))],
        EyeStyle::Happy => [(-1.0, Vec3::new(1.0, 1.1, 1.0)), (1.0, Vec3::new(1.0, 1.1, 1.0))],
        EyeStyle::Glitch => [(-1.0, Vec3::splat(1.3)), (1.0, Vec3::splat(0.7))],
        EyeStyle::Standard => [(-1.0, Vec3::ONE), (1.0, Vec3::ONE)],
    }
}
