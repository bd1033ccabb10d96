//! Orbit camera: damped spherical controller, drag to orbit, scroll to zoom.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use crate::config::CameraConfig;
use crate::lifecycle::{engine_running, EngineSet};
use crate::picking::{PickView, ViewParams};
use crate::pointer::PointerEvent;

/// Plugin for the orbit camera.
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OrbitCamera>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (
                    orbit_from_pointer,
                    zoom_from_scroll,
                    update_orbit,
                    apply_orbit_to_transform,
                )
                    .chain()
                    .in_set(EngineSet::Snapshot)
                    .run_if(engine_running),
            );
    }
}

/// Orbit camera controller resource.
///
/// Angles follow the usual spherical convention: `polar` is measured from
/// the +Y axis and `yaw` around it, starting at +Z.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Point the camera looks at.
    pub target: Vec3,
    pub yaw: f32,
    pub polar: f32,
    pub distance: f32,
    /// Values the current ones are damped toward.
    pub target_yaw: f32,
    pub target_polar: f32,
    pub target_distance: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub constraints: OrbitConstraints,
    /// Last pointer position seen while dragging.
    drag_from: Option<Vec2>,
}

/// Limits and rates for the orbit camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConstraints {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    /// Fraction of the remaining orbit applied per reference frame.
    pub damping: f32,
    /// Radians per dragged pixel.
    pub orbit_speed: f32,
    /// Fractional distance change per scroll line.
    pub zoom_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    /// Build a controller looking from `config.eye` at `config.target`.
    pub fn from_config(config: &CameraConfig) -> Self {
        let target = Vec3::from_array(config.target);
        let offset = Vec3::from_array(config.eye) - target;
        let distance = offset.length().max(f32::EPSILON);
        let polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        let yaw = offset.x.atan2(offset.z);

        Self {
            target,
            yaw,
            polar,
            distance,
            target_yaw: yaw,
            target_polar: polar,
            target_distance: distance,
            fov_y: config.fov_degrees.to_radians(),
            constraints: OrbitConstraints {
                min_distance: config.min_distance,
                max_distance: config.max_distance,
                min_polar: config.min_polar,
                max_polar: config.max_polar,
                damping: config.damping,
                orbit_speed: config.orbit_speed,
                zoom_speed: config.zoom_speed,
            },
            drag_from: None,
        }
    }

    /// Current eye position.
    pub fn eye(&self) -> Vec3 {
        self.target
            + self.distance
                * Vec3::new(
                    self.polar.sin() * self.yaw.sin(),
                    self.polar.cos(),
                    self.polar.sin() * self.yaw.cos(),
                )
    }

    /// Camera transform looking at the target.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }

    /// Camera parameters for hit testing.
    pub fn view(&self) -> ViewParams {
        ViewParams {
            eye: self.eye(),
            target: self.target,
            fov_y: self.fov_y,
        }
    }

    /// Orbit by a pointer delta in pixels.
    pub fn orbit_by(&mut self, delta: Vec2) {
        let c = self.constraints;
        self.target_yaw -= delta.x * c.orbit_speed;
        self.target_polar =
            (self.target_polar - delta.y * c.orbit_speed).clamp(c.min_polar, c.max_polar);
    }

    /// Zoom by scroll lines; positive zooms in.
    pub fn zoom_by(&mut self, lines: f32) {
        let c = self.constraints;
        self.target_distance = (self.target_distance * (1.0 - lines * c.zoom_speed))
            .clamp(c.min_distance, c.max_distance);
    }

    /// Damp current values toward their targets.
    pub fn update(&mut self, dt: f32) {
        let factor = 1.0 - (1.0 - self.constraints.damping).powf(dt * 60.0);
        self.yaw += (self.target_yaw - self.yaw) * factor;
        self.polar += (self.target_polar - self.polar) * factor;
        self.distance += (self.target_distance - self.distance) * factor;
    }
}

/// Marker component for the main camera.
#[derive(Component)]
pub struct MainCamera;

/// System to set up the camera on startup.
fn setup_camera(mut commands: Commands, orbit: Res<OrbitCamera>) {
    commands.spawn((
        Camera3dBundle {
            projection: Projection::Perspective(PerspectiveProjection {
                fov: orbit.fov_y,
                ..default()
            }),
            transform: orbit.transform(),
            ..default()
        },
        MainCamera,
    ));
}

/// System to orbit the camera while the pointer is dragged.
fn orbit_from_pointer(mut orbit: ResMut<OrbitCamera>, mut pointer: EventReader<PointerEvent>) {
    for event in pointer.read() {
        match *event {
            PointerEvent::Down(pos) => orbit.drag_from = Some(pos),
            PointerEvent::Up(_) => orbit.drag_from = None,
            PointerEvent::Move(pos) => {
                if let Some(from) = orbit.drag_from {
                    orbit.orbit_by(pos - from);
                    orbit.drag_from = Some(pos);
                }
            }
        }
    }
}

/// System to zoom the camera with the scroll wheel.
fn zoom_from_scroll(mut orbit: ResMut<OrbitCamera>, mut scroll: EventReader<MouseWheel>) {
    for ev in scroll.read() {
        let lines = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / 40.0,
        };
        orbit.zoom_by(lines);
    }
}

/// System to damp the orbit toward its targets.
fn update_orbit(mut orbit: ResMut<OrbitCamera>, time: Res<Time>) {
    orbit.update(time.delta_seconds());
}

/// System to apply the orbit to the camera transform and the pick view.
fn apply_orbit_to_transform(
    orbit: Res<OrbitCamera>,
    mut view: ResMut<PickView>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    for mut transform in camera_query.iter_mut() {
        *transform = orbit.transform();
    }
    view.camera = orbit.view();
}
