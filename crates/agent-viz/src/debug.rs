//! Debug overlay for development information display.
//!
//! Shows FPS, renderable count, hover and selection, smoothing mode, and the
//! roster revision. Toggle with F3 key.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::animation::{Smoothing, SmoothingMode};
use crate::camera::OrbitCamera;
use crate::hover::HoverBubble;
use crate::reconcile::LiveRenderables;
use crate::roster_loader::RosterLoadStatus;
use crate::store::{AgentStore, FrameSnapshot};

/// Plugin for the debug overlay.
pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugOverlay>()
            .add_systems(Startup, setup_debug_overlay)
            .add_systems(Update, (toggle_debug_overlay, update_debug_display).chain());
    }
}

/// Resource controlling debug overlay settings.
#[derive(Resource)]
pub struct DebugOverlay {
    /// Whether the debug overlay is visible.
    pub enabled: bool,
    /// Show FPS counter.
    pub show_fps: bool,
    /// Show camera information.
    pub show_camera_info: bool,
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self {
            enabled: false,
            show_fps: true,
            show_camera_info: true,
        }
    }
}

/// Component marking the debug overlay container.
#[derive(Component)]
pub struct DebugOverlayContainer;

/// Component for the debug text.
#[derive(Component)]
pub struct DebugText;

/// Local resource for FPS history.
#[derive(Default)]
struct FpsHistory {
    history: VecDeque<f32>,
}

impl FpsHistory {
    fn push(&mut self, fps: f32) {
        self.history.push_back(fps);
        if self.history.len() > 60 {
            self.history.pop_front();
        }
    }

    fn average(&self) -> f32 {
        if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f32>() / self.history.len() as f32
        }
    }
}

/// Engine state shown in the overlay.
struct DebugSnapshot<'a> {
    avg_fps: f32,
    renderables: usize,
    revision: u64,
    hovered: Option<&'a str>,
    selected: Option<&'a str>,
    smoothing: SmoothingMode,
    load_error: Option<&'a str>,
}

fn debug_lines(overlay: &DebugOverlay, camera: &OrbitCamera, info: &DebugSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    if overlay.show_fps {
        let fps_color = if info.avg_fps < 30.0 { "LOW!" } else { "" };
        lines.push(format!("FPS: {:.0} {}", info.avg_fps, fps_color));
    }

    if overlay.show_camera_info {
        lines.push(format!(
            "Orbit: yaw {:.2} polar {:.2} dist {:.1}",
            camera.yaw, camera.polar, camera.distance
        ));
    }

    lines.push(format!("Renderables: {}", info.renderables));
    lines.push(format!("Revision: {}", info.revision));
    lines.push(format!("Hovered: {}", info.hovered.unwrap_or("-")));
    lines.push(format!("Selected: {}", info.selected.unwrap_or("-")));
    lines.push(format!(
        "Smoothing: {}",
        match info.smoothing {
            SmoothingMode::FrameRateIndependent => "frame-rate independent",
            SmoothingMode::FixedStep => "fixed step",
        }
    ));

    if let Some(error) = info.load_error {
        lines.push(format!("ERROR: {}", error));
    }

    lines
}

/// System to set up the debug overlay UI.
fn setup_debug_overlay(mut commands: Commands) {
    // Debug overlay container (top-left)
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    top: Val::Px(10.0),
                    left: Val::Px(10.0),
                    padding: UiRect::all(Val::Px(10.0)),
                    flex_direction: FlexDirection::Column,
                    ..default()
                },
                background_color: Color::srgba(0.0, 0.0, 0.0, 0.8).into(),
                visibility: Visibility::Hidden,
                ..default()
            },
            DebugOverlayContainer,
        ))
        .with_children(|parent| {
            parent.spawn(TextBundle::from_section(
                "DEBUG (F3 to toggle)",
                TextStyle {
                    font_size: 14.0,
                    color: Color::srgb(0.9, 0.9, 0.3),
                    ..default()
                },
            ));

            parent.spawn((
                TextBundle::from_section(
                    "",
                    TextStyle {
                        font_size: 12.0,
                        color: Color::srgb(0.8, 0.8, 0.8),
                        ..default()
                    },
                ),
                DebugText,
            ));
        });
}

/// System to toggle debug overlay with F3.
fn toggle_debug_overlay(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut debug_overlay: ResMut<DebugOverlay>,
    mut container: Query<&mut Visibility, With<DebugOverlayContainer>>,
) {
    if keyboard.just_pressed(KeyCode::F3) {
        debug_overlay.enabled = !debug_overlay.enabled;

        for mut visibility in container.iter_mut() {
            *visibility = if debug_overlay.enabled {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }

        let status = if debug_overlay.enabled { "ON" } else { "OFF" };
        tracing::info!("Debug overlay: {}", status);
    }
}

/// System to update debug display data.
#[allow(clippy::too_many_arguments)]
fn update_debug_display(
    debug_overlay: Res<DebugOverlay>,
    camera: Res<OrbitCamera>,
    live: Res<LiveRenderables>,
    snapshot: Res<FrameSnapshot>,
    store: Res<AgentStore>,
    hover: Res<HoverBubble>,
    smoothing: Res<Smoothing>,
    load_status: Res<RosterLoadStatus>,
    time: Res<Time>,
    mut fps_history: Local<FpsHistory>,
    mut debug_text: Query<&mut Text, With<DebugText>>,
) {
    if !debug_overlay.enabled {
        return;
    }

    let dt = time.delta_seconds();
    if dt > 0.0 {
        fps_history.push(1.0 / dt);
    }

    let info = DebugSnapshot {
        avg_fps: fps_history.average(),
        renderables: live.len(),
        revision: snapshot.revision(),
        hovered: hover.agent_id(),
        selected: store.selected(),
        smoothing: smoothing.mode,
        load_error: load_status.last_error.as_deref(),
    };
    let lines = debug_lines(&debug_overlay, &camera, &info);

    for mut text in debug_text.iter_mut() {
        if let Some(section) = text.sections.first_mut() {
            section.value = lines.join("\n");
            section.style.color = if info.avg_fps < 30.0 {
                Color::srgb(1.0, 0.3, 0.3) // Red for low FPS
            } else if info.avg_fps < 55.0 {
                Color::srgb(1.0, 0.8, 0.3) // Yellow for medium FPS
            } else {
                Color::srgb(0.8, 0.8, 0.8)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_overlay_default() {
        let overlay = DebugOverlay::default();
        assert!(!overlay.enabled);
        assert!(overlay.show_fps);
        assert!(overlay.show_camera_info);
    }

    #[test]
    fn test_fps_history() {
        let mut history = FpsHistory::default();
        assert_eq!(history.average(), 0.0);

        history.push(60.0);
        history.push(60.0);
        assert_eq!(history.average(), 60.0);

        history.push(30.0);
        assert!((history.average() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_fps_history_is_bounded() {
        let mut history = FpsHistory::default();
        for _ in 0..100 {
            history.push(10.0);
        }
        for _ in 0..60 {
            history.push(60.0);
        }
        assert_eq!(history.average(), 60.0);
    }

    #[test]
    fn test_debug_lines() {
        let overlay = DebugOverlay {
            show_camera_info: false,
            ..Default::default()
        };
        let info = DebugSnapshot {
            avg_fps: 24.0,
            renderables: 3,
            revision: 7,
            hovered: Some("2"),
            selected: None,
            smoothing: SmoothingMode::FixedStep,
            load_error: Some("bad json"),
        };
        let lines = debug_lines(&overlay, &OrbitCamera::default(), &info);
        assert_eq!(lines[0], "FPS: 24 LOW!");
        assert!(lines.contains(&"Renderables: 3".to_string()));
        assert!(lines.contains(&"Hovered: 2".to_string()));
        assert!(lines.contains(&"Selected: -".to_string()));
        assert!(lines.contains(&"Smoothing: fixed step".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("ERROR: bad json"));
        assert!(!lines.iter().any(|l| l.starts_with("Orbit")));
    }
}
