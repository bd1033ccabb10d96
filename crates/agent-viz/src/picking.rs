//! Screen-space hit testing against renderable hit volumes.
//!
//! The math here has no render state: a [`PickView`]
//! describes the viewport and camera, so the same code serves the live window
//! and headless tests.

use agent_roster::AgentId;
use bevy::math::Dir3;
use bevy::prelude::*;

/// Invisible oriented box used for hover and click tests.
///
/// The owning agent id is stored on the volume itself, so a hit never needs a
/// walk up the hierarchy.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct HitVolume {
    pub agent_id: AgentId,
    pub half_extents: Vec3,
    /// Box center relative to the root, in root space.
    pub offset: Vec3,
}

/// Viewport rectangle and camera used to turn screen positions into rays.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PickView {
    /// Viewport in window pixels, y down.
    pub viewport: Rect,
    pub camera: ViewParams,
}

impl Default for PickView {
    fn default() -> Self {
        Self {
            viewport: Rect::new(0.0, 0.0, 1280.0, 720.0),
            camera: ViewParams::default(),
        }
    }
}

impl PickView {
    /// Ray from the camera through a screen position.
    pub fn ray_from_screen(&self, screen: Vec2) -> Option<Ray3d> {
        let ndc = screen_to_ndc(screen, self.viewport)?;
        let size = self.viewport.size();
        ray_through_ndc(&self.camera, size.x / size.y, ndc)
    }
}

/// Perspective camera parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            eye: Vec3::new(14.0, 12.0, 14.0),
            target: Vec3::ZERO,
            fov_y: 45f32.to_radians(),
        }
    }
}

/// Nearest hit found by [`pick`].
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub agent_id: AgentId,
    pub distance: f32,
}

/// Convert a screen position to normalized device coordinates.
///
/// Returns `None` for a degenerate viewport.
pub fn screen_to_ndc(screen: Vec2, viewport: Rect) -> Option<Vec2> {
    let size = viewport.size();
    if size.x <= 0.0 || size.y <= 0.0 || !size.is_finite() {
        return None;
    }
    let local = (screen - viewport.min) / size;
    Some(Vec2::new(local.x * 2.0 - 1.0, 1.0 - local.y * 2.0))
}

/// Cast a ray from the eye through a point in normalized device coordinates.
pub fn ray_through_ndc(view: &ViewParams, aspect: f32, ndc: Vec2) -> Option<Ray3d> {
    let forward = (view.target - view.eye).try_normalize()?;
    let right = forward
        .cross(Vec3::Y)
        .try_normalize()
        .unwrap_or(Vec3::X);
    let up = right.cross(forward);

    let half_height = (view.fov_y * 0.5).tan();
    let half_width = half_height * aspect;
    let direction = forward + right * ndc.x * half_width + up * ndc.y * half_height;

    Some(Ray3d {
        origin: view.eye,
        direction: Dir3::new(direction).ok()?,
    })
}

/// Distance along the ray to an oriented box, if it is hit.
///
/// A ray starting inside the box reports the exit distance.
pub fn intersect_volume(
    ray: Ray3d,
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
) -> Option<f32> {
    let inverse = rotation.inverse();
    let origin = inverse * (ray.origin - center);
    let direction = inverse * ray.direction.as_vec3();

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let (o, d, h) = (origin[axis], direction[axis], half_extents[axis]);
        if d.abs() < 1e-8 {
            if o.abs() > h {
                return None;
            }
            continue;
        }
        let a = (-h - o) / d;
        let b = (h - o) / d;
        t_min = t_min.max(a.min(b));
        t_max = t_max.min(a.max(b));
    }

    if t_max < t_min.max(0.0) {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Find the nearest hit volume along a ray.
pub fn pick<'a>(
    ray: Ray3d,
    volumes: impl IntoIterator<Item = (&'a Transform, &'a HitVolume)>,
) -> Option<PickHit> {
    let mut nearest: Option<PickHit> = None;
    for (transform, volume) in volumes {
        if volume.agent_id.is_empty() {
            continue;
        }
        let center = transform.translation + transform.rotation * volume.offset;
        let Some(distance) = intersect_volume(ray, center, transform.rotation, volume.half_extents)
        else {
            continue;
        };
        if nearest.as_ref().map_or(true, |hit| distance < hit.distance) {
            nearest = Some(PickHit {
                agent_id: volume.agent_id.clone(),
                distance,
            });
        }
    }
    nearest
}
