//! World rendering: sky color, lights, and the office floor.

use bevy::prelude::*;

/// Plugin for the static scene around the agents.
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::Srgba(SKY)))
            .insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: 400.0,
            })
            .add_systems(Startup, (spawn_lights, spawn_floor));
    }
}

const SKY: Srgba = Srgba {
    red: 0.835,
    green: 0.929,
    blue: 0.969,
    alpha: 1.0,
};

/// Side length of the square floor.
pub const FLOOR_SIZE: f32 = 30.0;
/// Floor slab thickness; its top face sits at y = 0.
pub const FLOOR_THICKNESS: f32 = 0.4;

/// Marker for the floor slab.
#[derive(Component)]
pub struct Floor;

/// Transform that puts the floor's top face at y = 0.
pub fn floor_transform() -> Transform {
    Transform::from_xyz(0.0, -FLOOR_THICKNESS / 2.0, 0.0)
}

/// System to spawn the sun and fill lights.
fn spawn_lights(mut commands: Commands) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(15.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

/// System to spawn the floor slab.
fn spawn_floor(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Cuboid::new(FLOOR_SIZE, FLOOR_THICKNESS, FLOOR_SIZE)),
            material: materials.add(StandardMaterial {
                base_color: Color::srgb_u8(0x88, 0xD8, 0x98),
                metallic: 0.05,
                perceptual_roughness: 0.95,
                ..default()
            }),
            transform: floor_transform(),
            ..default()
        },
        Floor,
        Name::new("floor"),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_top_is_ground_plane() {
        let transform = floor_transform();
        assert_eq!(transform.translation.y + FLOOR_THICKNESS / 2.0, 0.0);
    }
}
