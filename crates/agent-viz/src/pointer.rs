//! Pointer interaction: click/drag disambiguation, selection, and hover.
//!
//! Raw pointer input arrives as [`PointerEvent`]s. In the windowed app they
//! are forwarded from Bevy's mouse events; tests send them directly.

use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, WindowEvent};

use crate::hover::{HoverBubble, HoverChanged};
use crate::lifecycle::{engine_running, EngineRng, EngineSet};
use crate::picking::{pick, HitVolume, PickView};
use crate::store::{AgentSelected, FrameSnapshot};

/// Plugin for pointer resolution.
pub struct PointerPlugin;

impl Plugin for PointerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerSession>()
            .init_resource::<PointerSettings>()
            .init_resource::<PickView>()
            .add_event::<PointerEvent>()
            .add_systems(
                Update,
                resolve_pointer_events
                    .in_set(EngineSet::Interact)
                    .run_if(engine_running),
            );
    }
}

/// Raw pointer input in window pixels.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Up(Vec2),
    Move(Vec2),
}

/// Tunables for pointer resolution.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PointerSettings {
    /// Press/release distance below which a gesture is a click.
    pub click_threshold_px: f32,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            click_threshold_px: 5.0,
        }
    }
}

/// Outcome of a pointer release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    Click(Vec2),
    Drag { distance: f32 },
    /// Release with no recorded press.
    Stray,
}

/// Press and release positions of the current gesture.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSession {
    down: Option<Vec2>,
    up: Option<Vec2>,
}

impl PointerSession {
    pub fn press(&mut self, pos: Vec2) {
        self.down = Some(pos);
        self.up = None;
    }

    /// Resolve a release against the recorded press. Both positions are
    /// cleared whatever the outcome.
    pub fn release(&mut self, pos: Vec2, threshold: f32) -> Release {
        self.up = Some(pos);
        let outcome = match self.down {
            None => Release::Stray,
            Some(down) => {
                let distance = down.distance(pos);
                if distance < threshold {
                    Release::Click(pos)
                } else {
                    Release::Drag { distance }
                }
            }
        };
        self.reset();
        outcome
    }

    pub fn is_pressed(&self) -> bool {
        self.down.is_some()
    }

    pub fn reset(&mut self) {
        self.down = None;
        self.up = None;
    }
}

/// System to resolve pointer events into selections and hover changes.
#[allow(clippy::too_many_arguments)]
fn resolve_pointer_events(
    mut events: EventReader<PointerEvent>,
    mut session: ResMut<PointerSession>,
    settings: Res<PointerSettings>,
    view: Res<PickView>,
    snapshot: Res<FrameSnapshot>,
    volumes: Query<(&Transform, &HitVolume)>,
    mut hover: ResMut<HoverBubble>,
    mut rng: ResMut<EngineRng>,
    mut selections: EventWriter<AgentSelected>,
    mut hover_changes: EventWriter<HoverChanged>,
) {
    for event in events.read() {
        match *event {
            PointerEvent::Down(pos) => session.press(pos),
            PointerEvent::Up(pos) => match session.release(pos, settings.click_threshold_px) {
                Release::Click(pos) => {
                    let hit = view
                        .ray_from_screen(pos)
                        .and_then(|ray| pick(ray, volumes.iter()));
                    if let Some(hit) = hit {
                        tracing::debug!("Click on agent {} at {:.2}", hit.agent_id, hit.distance);
                        selections.send(AgentSelected {
                            agent_id: hit.agent_id,
                        });
                    }
                }
                Release::Drag { distance } => {
                    tracing::trace!("Drag of {:.1}px, no selection", distance);
                }
                Release::Stray => {}
            },
            PointerEvent::Move(pos) => {
                let hit = view
                    .ray_from_screen(pos)
                    .and_then(|ray| pick(ray, volumes.iter()));
                let changed = match hit {
                    Some(hit) => {
                        let variant = snapshot
                            .get(&hit.agent_id)
                            .map(|agent| agent.variant)
                            .unwrap_or_default();
                        hover.observe_hit(&hit.agent_id, variant, pos, &mut rng.0)
                    }
                    None => hover.observe_miss(),
                };
                if changed {
                    hover_changes.send(HoverChanged {
                        agent_id: hover.agent_id().map(str::to_string),
                    });
                }
            }
        }
    }
}

/// Translate window events into pointer events, keeping arrival order.
///
/// `cursor` carries the last known cursor position between calls; button
/// events take the position current at the time they arrived.
pub fn translate_window_events<'a>(
    events: impl IntoIterator<Item = &'a WindowEvent>,
    cursor: &mut Option<Vec2>,
) -> Vec<PointerEvent> {
    let mut out = Vec::new();
    for event in events {
        match event {
            WindowEvent::CursorMoved(moved) => {
                *cursor = Some(moved.position);
                out.push(PointerEvent::Move(moved.position));
            }
            WindowEvent::CursorLeft(_) => *cursor = None,
            WindowEvent::MouseButtonInput(input) if input.button == MouseButton::Left => {
                let Some(pos) = *cursor else {
                    continue;
                };
                out.push(match input.state {
                    ButtonState::Pressed => PointerEvent::Down(pos),
                    ButtonState::Released => PointerEvent::Up(pos),
                });
            }
            _ => {}
        }
    }
    out
}

/// System to forward window mouse input as pointer events.
pub fn forward_window_input(
    mut events: EventReader<WindowEvent>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cursor: Local<Option<Vec2>>,
    mut pointer: EventWriter<PointerEvent>,
) {
    if cursor.is_none() {
        *cursor = windows.get_single().ok().and_then(Window::cursor_position);
    }
    pointer.send_batch(translate_window_events(events.read(), &mut cursor));
}

/// System to keep the viewport in the pick view in step with the window.
pub fn sync_pick_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut view: ResMut<PickView>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let viewport = Rect::new(0.0, 0.0, window.width(), window.height());
    if view.viewport != viewport {
        view.viewport = viewport;
    }
}

/// System to show a hand cursor over agents and a grab cursor elsewhere.
pub fn update_cursor_icon(
    mut changes: EventReader<HoverChanged>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Some(change) = changes.read().last() else {
        return;
    };
    let Ok(mut window) = windows.get_single_mut() else {
        return;
    };
    window.cursor.icon = if change.agent_id.is_some() {
        CursorIcon::Pointer
    } else {
        CursorIcon::Grab
    };
}
