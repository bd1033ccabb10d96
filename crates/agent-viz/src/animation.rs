//! Procedural animation driven by each agent's behavioral state.
//!
//! Every frame, each live renderable reads its agent's state from the frame
//! snapshot and moves a fraction of the way toward a per-state target pose.
//! There is no explicit transition animation: exponential smoothing from the
//! previous frame's pose produces the blend when a state changes. The error
//! state bypasses smoothing for its jitter.

use agent_roster::AgentState;
use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::lifecycle::{engine_running, EngineRng, EngineSet};
use crate::reconcile::Renderable;
use crate::store::FrameSnapshot;

/// Plugin for per-frame renderable animation.
pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Smoothing>().add_systems(
            Update,
            (
                animate_renderables.in_set(EngineSet::Animate),
                present_effects.in_set(EngineSet::Present),
            )
                .run_if(engine_running),
        );
    }
}

/// How blend factors react to the frame time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Factors are rescaled by elapsed time so motion looks the same at any
    /// refresh rate.
    #[default]
    FrameRateIndependent,
    /// Factors are applied verbatim once per frame; motion speed follows the
    /// refresh rate.
    FixedStep,
}

/// Smoothing settings shared by every renderable.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    pub mode: SmoothingMode,
    /// Frame rate the per-frame factors were tuned at.
    pub reference_hz: f32,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            mode: SmoothingMode::FrameRateIndependent,
            reference_hz: 60.0,
        }
    }
}

impl Smoothing {
    /// Blend factor to apply this frame for a per-reference-frame factor.
    pub fn factor(&self, per_frame: f32, dt: f32) -> f32 {
        match self.mode {
            SmoothingMode::FixedStep => per_frame,
            SmoothingMode::FrameRateIndependent => {
                if dt <= 0.0 {
                    return 0.0;
                }
                1.0 - (1.0 - per_frame).powf(dt * self.reference_hz)
            }
        }
    }

    /// Scale a per-reference-frame increment to this frame.
    pub fn increment(&self, per_frame: f32, dt: f32) -> f32 {
        match self.mode {
            SmoothingMode::FixedStep => per_frame,
            SmoothingMode::FrameRateIndependent => per_frame * dt.max(0.0) * self.reference_hz,
        }
    }
}

/// Linear interpolation.
pub fn lerp(from: f32, to: f32, factor: f32) -> f32 {
    from + (to - from) * factor
}

/// Wrap an angle into `[-PI, PI)`.
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Amplitude of the sleeping float.
pub const SLEEP_FLOAT: f32 = 0.04;
/// Radius of the active wander.
pub const ACTIVE_WANDER_RADIUS: f32 = 0.5;
/// Radius of the working wander.
pub const WORK_WANDER_RADIUS: f32 = 0.3;
/// Peak-to-peak amplitude of the error jitter on x/z.
pub const ERROR_SHAKE: f32 = 0.03;
/// Per-frame probability of an error flicker.
pub const FLICKER_CHANCE: f64 = 0.1;
/// Rest height of the thought indicator above the root.
pub const THOUGHT_HEIGHT: f32 = 1.5;

/// Transient motion state of one renderable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    /// Smoothed x/z wander relative to the anchor.
    pub offset: Vec2,
    /// Euler angles (x, y, z) applied in XYZ order.
    pub rotation: Vec3,
    /// State seen on the previous animated frame.
    pub last_state: Option<AgentState>,
    /// Emissive intensity of the last error flicker.
    pub flicker: f32,
}

impl Motion {
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }
}

/// Thought indicator pose, relative to the root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThoughtPulse {
    pub height: f32,
    pub spin: f32,
    pub scale: f32,
}

/// Energy glow pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowPulse {
    pub opacity: f32,
    pub scale: f32,
}

/// Emissive highlight on the head; the variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Emissive {
    #[default]
    Off,
    /// Soft gold while thinking.
    Warm(f32),
    /// Agent display color while working.
    Tinted(f32),
    /// Intermittent red while in error.
    Flicker(f32),
}

/// Auxiliary effects computed for one frame.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Effects {
    pub thought: Option<ThoughtPulse>,
    pub glow: Option<GlowPulse>,
    pub emissive: Emissive,
}

impl Effects {
    pub fn thought_visible(&self) -> bool {
        self.thought.is_some()
    }

    pub fn glow_visible(&self) -> bool {
        self.glow.is_some()
    }
}

/// Per-frame inputs to [`step`].
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    pub state: AgentState,
    /// Seconds since engine start.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
}

/// Advance one renderable by one frame.
///
/// `translation` holds the previous frame's position on entry and the new
/// position on exit; `base` is the rest position derived from the anchor.
pub fn step(
    motion: &mut Motion,
    translation: &mut Vec3,
    base: Vec3,
    phase: f32,
    input: FrameInput,
    smoothing: &Smoothing,
    rng: &mut impl Rng,
) -> Effects {
    let t = input.elapsed + phase;
    let dt = input.dt;
    let f = |per_frame: f32| smoothing.factor(per_frame, dt);
    let entering = motion.last_state != Some(input.state);
    motion.last_state = Some(input.state);

    match input.state {
        AgentState::Sleeping => {
            translation.y = lerp(translation.y, base.y + (t * 0.8).sin() * SLEEP_FLOAT, f(0.05));
            motion.offset = motion.offset.lerp(Vec2::ZERO, f(0.05));
            settle_on_offset(translation, base, motion.offset);

            motion.rotation.y = lerp(motion.rotation.y, (t * 0.5).sin() * 0.05, f(0.05));
            level_pitch_roll(motion, f(0.1));
            Effects::default()
        }
        AgentState::Active => {
            translation.y = lerp(translation.y, base.y + (t * 1.5).sin() * 0.06, f(0.08));
            let wander = Vec2::new((t * 0.3).sin(), (t * 0.21).cos()) * ACTIVE_WANDER_RADIUS;
            motion.offset = motion.offset.lerp(wander, f(0.02));
            settle_on_offset(translation, base, motion.offset);

            motion.rotation.y = lerp(motion.rotation.y, (t * 0.8).sin() * 0.3, f(0.05));
            level_pitch_roll(motion, f(0.1));
            Effects::default()
        }
        AgentState::Thinking => {
            translation.y = lerp(translation.y, base.y + (t * 1.2).sin() * 0.05, f(0.06));
            motion.offset = motion.offset.lerp(Vec2::ZERO, f(0.08));
            settle_on_offset(translation, base, motion.offset);

            motion.rotation.z = lerp(motion.rotation.z, (t * 1.5).sin() * 0.12, f(0.08));
            motion.rotation.x = lerp(motion.rotation.x, (t * 1.2).sin() * 0.06, f(0.08));
            motion.rotation.y = lerp(motion.rotation.y, 0.0, f(0.1));
            Effects {
                thought: Some(ThoughtPulse {
                    height: THOUGHT_HEIGHT + (t * 2.0).sin() * 0.08,
                    spin: t * 0.5,
                    scale: 1.0 + (t * 3.0).sin() * 0.1,
                }),
                glow: None,
                emissive: Emissive::Warm(0.3 + (t * 2.0).sin() * 0.1),
            }
        }
        AgentState::Working => {
            let float = (t * 3.0).sin() * 0.1;
            let bounce = (t * 4.0).sin().abs() * 0.05;
            translation.y = lerp(translation.y, base.y + float + bounce, f(0.12));
            let wander = Vec2::new((t * 0.8).sin(), (t * 0.96).cos()) * WORK_WANDER_RADIUS;
            motion.offset = motion.offset.lerp(wander, f(0.06));
            settle_on_offset(translation, base, motion.offset);

            motion.rotation.y = wrap_angle(motion.rotation.y + smoothing.increment(0.025, dt));
            level_pitch_roll(motion, f(0.1));
            Effects {
                thought: None,
                glow: Some(GlowPulse {
                    opacity: 0.3 + (t * 6.0).sin() * 0.2,
                    scale: 1.0 + (t * 4.0).sin() * 0.15,
                }),
                emissive: Emissive::Tinted(0.5 + (t * 4.0).sin() * 0.2),
            }
        }
        AgentState::Error => {
            if entering {
                motion.flicker = 0.0;
            }
            motion.offset = Vec2::ZERO;
            let shake_x = (rng.gen::<f32>() - 0.5) * ERROR_SHAKE;
            let shake_z = (rng.gen::<f32>() - 0.5) * ERROR_SHAKE;
            *translation = base + Vec3::new(shake_x, (t * 8.0).sin() * 0.04, shake_z);

            let jitter_yaw = (t * 6.0).sin() * 0.3 + (rng.gen::<f32>() - 0.5) * 0.1;
            let jitter_roll = (rng.gen::<f32>() - 0.5) * 0.15;
            motion.rotation.y = lerp(motion.rotation.y, jitter_yaw, f(0.2));
            motion.rotation.z = lerp(motion.rotation.z, jitter_roll, f(0.3));
            motion.rotation.x = lerp(motion.rotation.x, 0.0, f(0.1));

            if rng.gen_bool(FLICKER_CHANCE) {
                motion.flicker = rng.gen::<f32>() * 0.8;
            }
            Effects {
                thought: None,
                glow: None,
                emissive: Emissive::Flicker(motion.flicker),
            }
        }
    }
}

fn settle_on_offset(translation: &mut Vec3, base: Vec3, offset: Vec2) {
    translation.x = base.x + offset.x;
    translation.z = base.z + offset.y;
}

fn level_pitch_roll(motion: &mut Motion, factor: f32) {
    motion.rotation.z = lerp(motion.rotation.z, 0.0, factor);
    motion.rotation.x = lerp(motion.rotation.x, 0.0, factor);
}

/// System to animate every live renderable from the frame snapshot.
fn animate_renderables(
    time: Res<Time>,
    snapshot: Res<FrameSnapshot>,
    smoothing: Res<Smoothing>,
    mut rng: ResMut<EngineRng>,
    mut renderables: Query<(&mut Renderable, &mut Transform, &mut Effects)>,
) {
    let elapsed = time.elapsed_seconds();
    let dt = time.delta_seconds();

    for (mut renderable, mut transform, mut effects) in renderables.iter_mut() {
        let Some(agent) = snapshot.get(renderable.agent_id()) else {
            // The reconciler removes these before animation runs; skip the
            // frame rather than animate against stale data.
            continue;
        };

        if renderable.motion.last_state != Some(agent.state) {
            tracing::debug!(
                "Agent {} is now {} (was {:?})",
                agent.id,
                agent.state,
                renderable.motion.last_state.map(|s| s.as_str())
            );
        }

        let base = renderable.base();
        let phase = renderable.phase();
        let mut translation = transform.translation;
        *effects = step(
            &mut renderable.motion,
            &mut translation,
            base,
            phase,
            FrameInput {
                state: agent.state,
                elapsed,
                dt,
            },
            &smoothing,
            &mut rng.0,
        );
        transform.translation = translation;
        transform.rotation = renderable.motion.rotation_quat();
    }
}

/// System to push computed effects onto child entities and materials.
fn present_effects(
    renderables: Query<(&Renderable, &Effects), Changed<Effects>>,
    mut parts: Query<(&mut Transform, &mut Visibility), Without<Renderable>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (renderable, effects) in renderables.iter() {
        let rig = renderable.rig();

        if let Ok((mut transform, mut visibility)) = parts.get_mut(rig.thought) {
            match effects.thought {
                Some(pulse) => {
                    *visibility = Visibility::Inherited;
                    transform.translation.y = pulse.height;
                    transform.rotation = Quat::from_rotation_y(pulse.spin);
                    transform.scale = Vec3::splat(pulse.scale);
                }
                None => *visibility = Visibility::Hidden,
            }
        }

        if let Ok((mut transform, mut visibility)) = parts.get_mut(rig.glow) {
            match effects.glow {
                Some(pulse) => {
                    *visibility = Visibility::Inherited;
                    transform.scale = Vec3::splat(pulse.scale);
                    if let Some(material) = materials.get_mut(&rig.glow_material) {
                        material.base_color = Color::Srgba(Srgba {
                            alpha: pulse.opacity,
                            ..rig.accent
                        });
                    }
                }
                None => *visibility = Visibility::Hidden,
            }
        }

        if let Some(material) = materials.get_mut(&rig.head_material) {
            material.emissive = match effects.emissive {
                Emissive::Off => LinearRgba::BLACK,
                Emissive::Warm(intensity) => scaled(LinearRgba::from(WARM_GLOW), intensity),
                Emissive::Tinted(intensity) => scaled(LinearRgba::from(rig.display), intensity),
                Emissive::Flicker(intensity) => LinearRgba::rgb(intensity, 0.0, 0.0),
            };
        }
    }
}

/// Gold used for the thinking highlight.
const WARM_GLOW: Srgba = Srgba {
    red: 1.0,
    green: 0.843,
    blue: 0.0,
    alpha: 1.0,
};

fn scaled(color: LinearRgba, intensity: f32) -> LinearRgba {
    LinearRgba::rgb(
        color.red * intensity,
        color.green * intensity,
        color.blue * intensity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn run(
        motion: &mut Motion,
        translation: &mut Vec3,
        base: Vec3,
        state: AgentState,
        frames: usize,
        start: f32,
        smoothing: &Smoothing,
        rng: &mut SmallRng,
    ) -> Vec<(Vec3, Effects)> {
        (0..frames)
            .map(|i| {
                let effects = step(
                    motion,
                    translation,
                    base,
                    0.0,
                    FrameInput {
                        state,
                        elapsed: start + i as f32 * DT,
                        dt: DT,
                    },
                    smoothing,
                    rng,
                );
                (*translation, effects)
            })
            .collect()
    }

    #[test]
    fn test_lerp_and_wrap() {
        assert_eq!(lerp(0.0, 10.0, 0.25), 2.5);
        assert!((wrap_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
        assert!(wrap_angle(7.0) < PI && wrap_angle(7.0) >= -PI);
    }

    #[test]
    fn test_fixed_step_factor_ignores_dt() {
        let smoothing = Smoothing {
            mode: SmoothingMode::FixedStep,
            reference_hz: 60.0,
        };
        assert_eq!(smoothing.factor(0.05, 1.0 / 144.0), 0.05);
        assert_eq!(smoothing.factor(0.05, 1.0 / 30.0), 0.05);
        assert_eq!(smoothing.increment(0.025, 1.0 / 30.0), 0.025);
    }

    #[test]
    fn test_frame_rate_independent_factor() {
        let smoothing = Smoothing::default();

        // One reference frame reproduces the tuned factor.
        assert!((smoothing.factor(0.05, 1.0 / 60.0) - 0.05).abs() < 1e-5);

        // Two half-length frames converge exactly as far as one full frame.
        let half = smoothing.factor(0.05, 1.0 / 120.0);
        let remaining = (1.0 - half) * (1.0 - half);
        assert!((1.0 - remaining - 0.05).abs() < 1e-5);

        assert_eq!(smoothing.factor(0.05, 0.0), 0.0);
        assert!((smoothing.increment(0.025, 1.0 / 30.0) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_sleeping_stays_in_float_band() {
        let mut rng = SmallRng::seed_from_u64(1);
        let base = Vec3::new(-3.0, 1.3, 0.0);
        let mut motion = Motion::default();
        let mut translation = base;

        for smoothing in [
            Smoothing::default(),
            Smoothing {
                mode: SmoothingMode::FixedStep,
                reference_hz: 60.0,
            },
        ] {
            let frames = run(
                &mut motion,
                &mut translation,
                base,
                AgentState::Sleeping,
                1200,
                0.0,
                &smoothing,
                &mut rng,
            );
            for (position, effects) in frames {
                assert!((position.y - base.y).abs() <= SLEEP_FLOAT + 1e-5);
                assert!((position.x - base.x).abs() < 1e-6);
                assert!((position.z - base.z).abs() < 1e-6);
                assert_eq!(effects, Effects::default());
            }
        }
    }

    #[test]
    fn test_working_widens_motion() {
        let mut rng = SmallRng::seed_from_u64(2);
        let smoothing = Smoothing::default();
        let base = Vec3::new(0.0, 1.3, 0.0);
        let mut motion = Motion::default();
        let mut translation = base;

        let sleeping = run(
            &mut motion,
            &mut translation,
            base,
            AgentState::Sleeping,
            300,
            0.0,
            &smoothing,
            &mut rng,
        );
        let working = run(
            &mut motion,
            &mut translation,
            base,
            AgentState::Working,
            600,
            5.0,
            &smoothing,
            &mut rng,
        );

        let vertical = |frames: &[(Vec3, Effects)]| {
            frames
                .iter()
                .map(|(p, _)| (p.y - base.y).abs())
                .fold(0.0f32, f32::max)
        };
        let horizontal = |frames: &[(Vec3, Effects)]| {
            frames
                .iter()
                .map(|(p, _)| Vec2::new(p.x - base.x, p.z - base.z).length())
                .fold(0.0f32, f32::max)
        };

        assert!(vertical(&working) > vertical(&sleeping));
        assert!(vertical(&working) > SLEEP_FLOAT);
        assert!(horizontal(&sleeping) < 1e-6);
        assert!(horizontal(&working) > 0.05);
        assert!(horizontal(&working) <= WORK_WANDER_RADIUS * std::f32::consts::SQRT_2 + 1e-4);
        assert!(working.iter().all(|(_, e)| e.glow_visible() && !e.thought_visible()));
    }

    #[test]
    fn test_thinking_shows_thought_and_warm_glow() {
        let mut rng = SmallRng::seed_from_u64(3);
        let base = Vec3::new(0.0, 1.3, 0.0);
        let mut motion = Motion::default();
        let mut translation = base;

        let frames = run(
            &mut motion,
            &mut translation,
            base,
            AgentState::Thinking,
            10,
            0.0,
            &Smoothing::default(),
            &mut rng,
        );
        for (_, effects) in frames {
            let pulse = effects.thought.expect("thought indicator visible");
            assert!((pulse.height - THOUGHT_HEIGHT).abs() <= 0.08 + 1e-5);
            assert!(effects.glow.is_none());
            assert!(matches!(effects.emissive, Emissive::Warm(i) if (0.2..=0.4).contains(&i)));
        }
    }

    #[test]
    fn test_active_to_error_discards_wander() {
        let mut rng = SmallRng::seed_from_u64(4);
        let smoothing = Smoothing::default();
        let base = Vec3::new(0.0, 1.3, -3.0);
        let mut motion = Motion::default();
        let mut translation = base;

        run(
            &mut motion,
            &mut translation,
            base,
            AgentState::Active,
            240,
            0.0,
            &smoothing,
            &mut rng,
        );
        assert!(motion.offset.length() > 0.01);

        let effects = step(
            &mut motion,
            &mut translation,
            base,
            0.0,
            FrameInput {
                state: AgentState::Error,
                elapsed: 4.0,
                dt: DT,
            },
            &smoothing,
            &mut rng,
        );

        assert_eq!(motion.offset, Vec2::ZERO);
        assert!((translation.x - base.x).abs() <= ERROR_SHAKE / 2.0);
        assert!((translation.z - base.z).abs() <= ERROR_SHAKE / 2.0);
        assert!((translation.y - (base.y + (4.0f32 * 8.0).sin() * 0.04)).abs() < 1e-5);
        assert!(!effects.glow_visible());
        assert!(!effects.thought_visible());
        assert!(matches!(effects.emissive, Emissive::Flicker(_)));
    }

    #[test]
    fn test_error_jitter_is_not_smoothed() {
        let mut rng = SmallRng::seed_from_u64(5);
        let base = Vec3::new(3.0, 1.3, 0.0);
        let mut motion = Motion::default();
        let mut translation = base;

        let frames = run(
            &mut motion,
            &mut translation,
            base,
            AgentState::Error,
            120,
            0.0,
            &Smoothing::default(),
            &mut rng,
        );
        let distinct_x = frames
            .windows(2)
            .filter(|w| (w[0].0.x - w[1].0.x).abs() > 1e-6)
            .count();
        assert!(distinct_x > 100);
        for (position, _) in &frames {
            assert!((position.x - base.x).abs() <= ERROR_SHAKE / 2.0);
        }
    }

    #[test]
    fn test_entering_error_resets_flicker() {
        let mut rng = SmallRng::seed_from_u64(6);
        let mut motion = Motion {
            flicker: 0.7,
            last_state: Some(AgentState::Working),
            ..Default::default()
        };
        let mut translation = Vec3::ZERO;

        let effects = step(
            &mut motion,
            &mut translation,
            Vec3::ZERO,
            0.0,
            FrameInput {
                state: AgentState::Error,
                elapsed: 0.0,
                dt: DT,
            },
            &Smoothing::default(),
            &mut rng,
        );
        match effects.emissive {
            Emissive::Flicker(intensity) => {
                assert_ne!(intensity, 0.7);
                assert!(intensity <= 0.8);
            }
            other => panic!("unexpected emissive {:?}", other),
        }
    }

    #[test]
    fn test_working_spin_wraps() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut motion = Motion::default();
        let mut translation = Vec3::ZERO;
        run(
            &mut motion,
            &mut translation,
            Vec3::ZERO,
            AgentState::Working,
            2000,
            0.0,
            &Smoothing::default(),
            &mut rng,
        );
        assert!(motion.rotation.y >= -PI && motion.rotation.y < PI);
    }

    #[test]
    fn test_phase_desynchronizes_entities() {
        let mut rng = SmallRng::seed_from_u64(8);
        let base = Vec3::new(0.0, 1.3, 0.0);
        let smoothing = Smoothing {
            mode: SmoothingMode::FixedStep,
            reference_hz: 60.0,
        };
        let input = FrameInput {
            state: AgentState::Active,
            elapsed: 2.0,
            dt: DT,
        };

        let mut a = Motion::default();
        let mut b = Motion::default();
        let mut pa = base;
        let mut pb = base;
        for _ in 0..30 {
            step(&mut a, &mut pa, base, 0.0, input, &smoothing, &mut rng);
            step(&mut b, &mut pb, base, 1.7, input, &smoothing, &mut rng);
        }
        assert!((pa - pb).length() > 1e-4);
    }
}
