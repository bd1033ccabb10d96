//! UI overlays: hover message bubble and office status board.

use agent_roster::RosterStats;
use bevy::prelude::*;

use crate::hover::HoverBubble;
use crate::lifecycle::EngineSet;
use crate::status::StatusBoard;

/// Plugin for UI overlay rendering.
pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BubbleLayout>()
            .add_systems(Startup, (setup_hover_bubble, setup_status_board))
            .add_systems(
                Update,
                (update_hover_bubble, update_status_board).after(EngineSet::Present),
            );
    }
}

/// Width of the hover bubble in pixels.
pub const BUBBLE_WIDTH: f32 = 180.0;

/// Placement of the hover bubble relative to the pointer.
#[derive(Resource, Debug, Clone, Copy)]
pub struct BubbleLayout {
    /// Pixels the bubble floats above the pointer.
    pub offset_px: f32,
}

impl Default for BubbleLayout {
    fn default() -> Self {
        Self { offset_px: 80.0 }
    }
}

/// Top-left corner of a bubble centered horizontally over the pointer.
pub fn bubble_position(pointer: Vec2, layout: &BubbleLayout) -> Vec2 {
    Vec2::new(pointer.x - BUBBLE_WIDTH / 2.0, pointer.y - layout.offset_px)
}

/// Lines shown on the status board.
pub fn status_lines(stats: &RosterStats) -> [String; 3] {
    [
        format!("AGENTS ONLINE  {}", stats.agents_online),
        format!("TASKS RUNNING  {}", stats.tasks_running),
        format!("ERRORS  {}", stats.errors),
    ]
}

/// Component marking the hover bubble container.
#[derive(Component)]
pub struct HoverBubbleNode;

/// Component for the hover bubble text.
#[derive(Component)]
pub struct HoverBubbleText;

/// Component for the status board text.
#[derive(Component)]
pub struct StatusBoardText;

/// System to set up the hover bubble UI.
fn setup_hover_bubble(mut commands: Commands) {
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Px(BUBBLE_WIDTH),
                    padding: UiRect::axes(Val::Px(12.0), Val::Px(8.0)),
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                background_color: Color::srgba(1.0, 1.0, 1.0, 0.95).into(),
                border_radius: BorderRadius::all(Val::Px(12.0)),
                visibility: Visibility::Hidden,
                z_index: ZIndex::Global(10),
                ..default()
            },
            HoverBubbleNode,
        ))
        .with_children(|parent| {
            parent.spawn((
                TextBundle::from_section(
                    "",
                    TextStyle {
                        font_size: 14.0,
                        color: Color::srgb(0.2, 0.2, 0.25),
                        ..default()
                    },
                ),
                HoverBubbleText,
            ));
        });
}

/// System to set up the status board UI (top-right).
fn setup_status_board(mut commands: Commands) {
    commands
        .spawn(NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                right: Val::Px(10.0),
                padding: UiRect::all(Val::Px(10.0)),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            background_color: Color::srgba(0.1, 0.15, 0.2, 0.8).into(),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                TextBundle::from_section(
                    status_lines(&RosterStats::default()).join("\n"),
                    TextStyle {
                        font_size: 14.0,
                        color: Color::srgb(0.85, 0.95, 1.0),
                        ..default()
                    },
                ),
                StatusBoardText,
            ));
        });
}

/// System to move and fill the hover bubble from hover state.
fn update_hover_bubble(
    hover: Res<HoverBubble>,
    layout: Res<BubbleLayout>,
    mut bubble: Query<(&mut Style, &mut Visibility), With<HoverBubbleNode>>,
    mut text: Query<&mut Text, With<HoverBubbleText>>,
) {
    if !hover.is_changed() {
        return;
    }

    let shown = match (hover.screen_pos(), hover.message()) {
        (Some(pos), Some(message)) if hover.is_hovering() => Some((pos, message)),
        _ => None,
    };

    for (mut style, mut visibility) in bubble.iter_mut() {
        match shown {
            Some((pos, _)) => {
                let corner = bubble_position(pos, &layout);
                style.left = Val::Px(corner.x);
                style.top = Val::Px(corner.y);
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }

    if let Some((_, message)) = shown {
        for mut text in text.iter_mut() {
            if let Some(section) = text.sections.first_mut() {
                if section.value != message {
                    section.value = message.to_string();
                }
            }
        }
    }
}

/// System to refresh the status board text when the counters change.
fn update_status_board(board: Res<StatusBoard>, mut text: Query<&mut Text, With<StatusBoardText>>) {
    if !board.is_changed() {
        return;
    }
    let value = status_lines(&board.stats()).join("\n");
    for mut text in text.iter_mut() {
        if let Some(section) = text.sections.first_mut() {
            section.value.clone_from(&value);
        }
    }
}
