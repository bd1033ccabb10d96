//! Headless engine tests: reconciliation, pointer resolution, animation
//! effects, and teardown driven through a real Bevy `App`.

use agent_roster::fixtures;
use agent_roster::{Agent, AgentRoster, AgentState, AgentUpdate, AgentVariant};
use agent_viz::animation::{Effects, GlowPulse};
use agent_viz::hover::{HoverBubble, HoverChanged};
use agent_viz::lifecycle::{EngineLifecycle, EngineRng, EngineTeardown};
use agent_viz::picking::PickView;
use agent_viz::pointer::PointerEvent;
use agent_viz::reconcile::{LiveRenderables, Renderable, RenderableRig};
use agent_viz::roster_loader::{
    RosterLoadStatus, RosterLoaderPlugin, RosterSource, RosterWatcher,
};
use agent_viz::status::StatusBoard;
use agent_viz::store::{AgentSelected, AgentStore};
use agent_viz::AgentEnginePlugin;
use bevy::app::AppExit;
use bevy::prelude::*;
use std::io::Write;

#[derive(Resource, Default)]
struct Collected {
    selections: Vec<String>,
    hover: Vec<Option<String>>,
}

fn collect_signals(
    mut collected: ResMut<Collected>,
    mut selections: EventReader<AgentSelected>,
    mut hover: EventReader<HoverChanged>,
) {
    for event in selections.read() {
        collected.selections.push(event.agent_id.clone());
    }
    for event in hover.read() {
        collected.hover.push(event.agent_id.clone());
    }
}

fn test_app(roster: AgentRoster) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .init_resource::<Assets<Mesh>>()
        .init_resource::<Assets<StandardMaterial>>()
        .insert_resource(EngineRng::seeded(42))
        .insert_resource(AgentStore(roster))
        .add_plugins(AgentEnginePlugin)
        .init_resource::<Collected>()
        .add_systems(Last, collect_signals);
    app
}

fn sleeping(id: &str, position: [f32; 3]) -> Agent {
    fixtures::agent(id, AgentState::Sleeping, position)
}

fn two_sleepers() -> AgentRoster {
    AgentRoster::new(vec![
        sleeping("left", [-6.0, 0.0, 0.0]),
        sleeping("right", [6.0, 0.0, 0.0]),
    ])
    .unwrap()
}

fn entity_of(app: &App, id: &str) -> Entity {
    app.world()
        .resource::<LiveRenderables>()
        .get(id)
        .unwrap_or_else(|| panic!("no renderable for {}", id))
}

/// Screen position of a world point under the pick view's camera.
fn project(view: &PickView, point: Vec3) -> Vec2 {
    let camera = view.camera;
    let forward = (camera.target - camera.eye).normalize();
    let right = forward.cross(Vec3::Y).normalize();
    let up = right.cross(forward);

    let relative = point - camera.eye;
    let depth = relative.dot(forward);
    let size = view.viewport.size();
    let half_height = (camera.fov_y * 0.5).tan();
    let half_width = half_height * size.x / size.y;
    let ndc = Vec2::new(
        relative.dot(right) / depth / half_width,
        relative.dot(up) / depth / half_height,
    );
    view.viewport.min + Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y)
}

/// Screen position of an agent's hit box center.
fn screen_of(app: &App, id: &str) -> Vec2 {
    let transform = app
        .world()
        .get::<Transform>(entity_of(app, id))
        .expect("transform");
    let center = transform.translation + Vec3::new(0.0, 0.4, 0.0);
    project(app.world().resource::<PickView>(), center)
}

fn renderable_count(app: &mut App) -> usize {
    let mut query = app.world_mut().query::<&Renderable>();
    query.iter(app.world()).count()
}

fn send(app: &mut App, event: PointerEvent) {
    app.world_mut().send_event(event);
}

#[test]
fn test_scenario_a_new_agent_adds_one_renderable() {
    let mut app = test_app(AgentRoster::seeded());
    app.update();

    let before: Vec<Entity> = ["1", "2", "3"].iter().map(|id| entity_of(&app, id)).collect();
    assert_eq!(app.world().resource::<LiveRenderables>().len(), 3);

    let new_id = app.world_mut().resource_mut::<AgentStore>().add_agent();
    app.update();

    let live = app.world().resource::<LiveRenderables>();
    assert_eq!(live.len(), 4);
    assert!(live.contains(&new_id));
    let after: Vec<Entity> = ["1", "2", "3"].iter().map(|id| entity_of(&app, id)).collect();
    assert_eq!(before, after);
}

#[test]
fn test_reconcile_matches_snapshot_and_keeps_identity() {
    let mut app = test_app(AgentRoster::new(fixtures::row_of_agents(4)).unwrap());
    app.update();

    let kept = entity_of(&app, "agent_001");
    let dropped = entity_of(&app, "agent_000");

    let s2 = vec![
        fixtures::agent("agent_001", AgentState::Working, [3.0, 0.0, 0.0]),
        fixtures::agent("agent_003", AgentState::Active, [9.0, 0.0, 0.0]),
        fixtures::agent("fresh", AgentState::Thinking, [0.0, 0.0, 6.0]),
    ];
    app.world_mut()
        .resource_mut::<AgentStore>()
        .replace_agents(s2)
        .unwrap();
    app.update();

    let live = app.world().resource::<LiveRenderables>();
    let mut ids: Vec<&str> = live.ids().into_iter().collect();
    ids.sort();
    assert_eq!(ids, vec!["agent_001", "agent_003", "fresh"]);
    assert_eq!(entity_of(&app, "agent_001"), kept);
    assert!(app.world().get_entity(dropped).is_none());

    assert_eq!(renderable_count(&mut app), 3);
}

#[test]
fn test_attribute_changes_do_not_rebuild() {
    let mut app = test_app(AgentRoster::seeded());
    app.update();
    let entity = entity_of(&app, "2");
    let phase = app.world().get::<Renderable>(entity).unwrap().phase();

    app.world_mut().resource_mut::<AgentStore>().update_agent(
        "2",
        AgentUpdate {
            name: Some("Renamed".into()),
            state: Some(AgentState::Thinking),
            display_color: Some("#000000".into()),
        },
    );
    app.update();

    assert_eq!(entity_of(&app, "2"), entity);
    assert_eq!(app.world().get::<Renderable>(entity).unwrap().phase(), phase);
}

#[test]
fn test_scenario_b_short_release_selects() {
    let mut app = test_app(two_sleepers());
    app.update();

    let target = screen_of(&app, "right");
    send(&mut app, PointerEvent::Down(target));
    send(&mut app, PointerEvent::Up(target + Vec2::new(2.0, 1.0)));
    app.update();

    assert_eq!(
        app.world().resource::<Collected>().selections,
        vec!["right".to_string()]
    );
    assert_eq!(app.world().resource::<AgentStore>().selected(), Some("right"));
}

#[test]
fn test_scenario_c_drag_never_selects() {
    let mut app = test_app(two_sleepers());
    app.update();

    let target = screen_of(&app, "left");
    send(&mut app, PointerEvent::Down(target));
    send(&mut app, PointerEvent::Up(target + Vec2::new(40.0, 0.0)));
    app.update();

    assert!(app.world().resource::<Collected>().selections.is_empty());
    assert_eq!(app.world().resource::<AgentStore>().selected(), None);
}

#[test]
fn test_click_miss_keeps_selection() {
    let mut app = test_app(two_sleepers());
    app.update();

    let target = screen_of(&app, "left");
    send(&mut app, PointerEvent::Down(target));
    send(&mut app, PointerEvent::Up(target));
    app.update();
    assert_eq!(app.world().resource::<AgentStore>().selected(), Some("left"));

    // Top-left corner looks at empty sky.
    send(&mut app, PointerEvent::Down(Vec2::new(2.0, 2.0)));
    send(&mut app, PointerEvent::Up(Vec2::new(2.0, 2.0)));
    app.update();

    assert_eq!(app.world().resource::<Collected>().selections.len(), 1);
    assert_eq!(app.world().resource::<AgentStore>().selected(), Some("left"));
}

#[test]
fn test_hover_switch_has_no_intermediate_clear() {
    let mut app = test_app(two_sleepers());
    app.update();

    let left = screen_of(&app, "left");
    send(&mut app, PointerEvent::Move(left));
    app.update();
    send(&mut app, PointerEvent::Move(left + Vec2::new(1.0, 0.0)));
    app.update();

    let right = screen_of(&app, "right");
    send(&mut app, PointerEvent::Move(right));
    app.update();

    let hover = app.world().resource::<HoverBubble>();
    assert_eq!(hover.agent_id(), Some("right"));
    assert_eq!(hover.variant(), Some(AgentVariant::Joy));
    assert_eq!(hover.screen_pos(), Some(right));
    assert!(hover.message().is_some());
    assert_eq!(
        app.world().resource::<Collected>().hover,
        vec![Some("left".to_string()), Some("right".to_string())]
    );

    send(&mut app, PointerEvent::Move(Vec2::new(2.0, 2.0)));
    app.update();
    let hover = app.world().resource::<HoverBubble>();
    assert!(!hover.is_hovering());
    assert!(!hover.reroll_pending());
    assert_eq!(app.world().resource::<Collected>().hover.last(), Some(&None));
}

#[test]
fn test_hover_cleared_when_renderable_removed() {
    let mut app = test_app(two_sleepers());
    app.update();

    let left = screen_of(&app, "left");
    send(&mut app, PointerEvent::Move(left));
    app.update();
    assert_eq!(app.world().resource::<HoverBubble>().agent_id(), Some("left"));

    app.world_mut()
        .resource_mut::<AgentStore>()
        .remove_agent("left");
    app.update();

    assert!(!app.world().resource::<HoverBubble>().is_hovering());
    assert_eq!(
        app.world().resource::<Collected>().hover,
        vec![Some("left".to_string()), None]
    );
}

#[test]
fn test_scenario_d_working_to_error_hides_glow() {
    let roster = AgentRoster::new(vec![fixtures::agent(
        "w",
        AgentState::Working,
        [0.0, 0.0, 0.0],
    )])
    .unwrap();
    let mut app = test_app(roster);
    for _ in 0..5 {
        app.update();
    }

    let entity = entity_of(&app, "w");
    let glow = app.world().get::<Renderable>(entity).unwrap().rig().glow;
    assert!(app.world().get::<Effects>(entity).unwrap().glow_visible());
    assert_eq!(
        app.world().get::<Visibility>(glow),
        Some(&Visibility::Inherited)
    );

    app.world_mut()
        .resource_mut::<AgentStore>()
        .update_state("w", AgentState::Error);
    app.update();

    let renderable = app.world().get::<Renderable>(entity).unwrap();
    assert_eq!(renderable.motion.offset, Vec2::ZERO);
    let effects = app.world().get::<Effects>(entity).unwrap();
    assert!(!effects.glow_visible());
    assert!(!effects.thought_visible());
    assert_eq!(app.world().get::<Visibility>(glow), Some(&Visibility::Hidden));

    let translation = app.world().get::<Transform>(entity).unwrap().translation;
    assert!(translation.x.abs() <= 0.015);
    assert!(translation.z.abs() <= 0.015);
}

#[test]
fn test_factory_failure_is_skipped_then_retried() {
    let mut broken = sleeping("broken", [0.0, 0.0, 6.0]);
    broken.display_color = "not-a-color".into();
    let roster = AgentRoster::new(vec![sleeping("ok", [0.0, 0.0, 0.0]), broken]).unwrap();

    let mut app = test_app(roster);
    app.update();
    app.update();

    let live = app.world().resource::<LiveRenderables>();
    assert!(live.contains("ok"));
    assert!(!live.contains("broken"));

    app.world_mut().resource_mut::<AgentStore>().update_agent(
        "broken",
        AgentUpdate {
            display_color: Some("#FFAA00".into()),
            ..Default::default()
        },
    );
    app.update();
    assert!(app.world().resource::<LiveRenderables>().contains("broken"));
}

#[test]
fn test_non_finite_anchor_is_logged_once() {
    let roster = AgentRoster::new(vec![
        sleeping("ok", [0.0, 0.0, 0.0]),
        sleeping("adrift", [f32::NAN, 0.0, 2.0]),
    ])
    .unwrap();

    let mut app = test_app(roster);
    for _ in 0..5 {
        app.update();
    }

    let live = app.world().resource::<LiveRenderables>();
    assert!(live.contains("ok"));
    assert!(!live.contains("adrift"));
    assert!(live.rejection("adrift").is_some());
    assert_eq!(live.rejections_logged(), 1);
}

#[test]
fn test_renderable_without_agent_is_left_alone() {
    let mut app = test_app(two_sleepers());
    app.update();

    let transform = Transform::from_xyz(1.0, 2.0, 3.0);
    let effects = Effects {
        glow: Some(GlowPulse {
            opacity: 0.9,
            scale: 2.0,
        }),
        ..Default::default()
    };
    let orphan = app
        .world_mut()
        .spawn((
            Renderable::new(
                "ghost".to_string(),
                AgentVariant::Glitch,
                Vec3::new(1.0, 1.3, 3.0),
                0.5,
                RenderableRig {
                    thought: Entity::PLACEHOLDER,
                    glow: Entity::PLACEHOLDER,
                    head_material: Handle::default(),
                    glow_material: Handle::default(),
                    accent: Srgba::WHITE,
                    display: Srgba::WHITE,
                },
            ),
            transform,
            effects,
        ))
        .id();

    app.update();
    app.update();

    assert_eq!(app.world().get::<Transform>(orphan), Some(&transform));
    assert_eq!(app.world().get::<Effects>(orphan), Some(&effects));
    assert!(!app.world().resource::<LiveRenderables>().contains("ghost"));
    assert_eq!(app.world().resource::<LiveRenderables>().len(), 2);
}

#[test]
fn test_status_board_counts_snapshot() {
    let mut app = test_app(fixtures::sample_roster());
    app.update();

    let stats = app.world().resource::<StatusBoard>().stats();
    assert_eq!(stats.agents_online, 4);
    assert_eq!(stats.tasks_running, 2);
    assert_eq!(stats.errors, 1);
}

#[test]
fn test_teardown_releases_everything() {
    let mut app = test_app(two_sleepers());
    app.update();

    let left = screen_of(&app, "left");
    let entities = [entity_of(&app, "left"), entity_of(&app, "right")];
    send(&mut app, PointerEvent::Move(left));
    app.update();
    assert!(app.world().resource::<HoverBubble>().is_hovering());

    app.world_mut().send_event(EngineTeardown);
    app.update();

    assert_eq!(
        *app.world().resource::<EngineLifecycle>(),
        EngineLifecycle::TornDown
    );
    assert!(app.world().resource::<LiveRenderables>().is_empty());
    for entity in entities {
        assert!(app.world().get_entity(entity).is_none());
    }
    assert!(!app.world().resource::<HoverBubble>().is_hovering());
    assert!(!app.world().resource::<StatusBoard>().is_scheduled());

    // Nothing ticks after teardown.
    app.world_mut().resource_mut::<AgentStore>().add_agent();
    app.update();
    assert!(app.world().resource::<LiveRenderables>().is_empty());
    assert_eq!(renderable_count(&mut app), 0);
}

#[test]
fn test_teardown_stops_roster_watcher() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = fixtures::sample_roster().to_json().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let mut app = test_app(AgentRoster::seeded());
    app.insert_resource(RosterSource {
        path: Some(file.path().to_path_buf()),
    })
    .add_plugins(RosterLoaderPlugin);
    app.update();

    assert_eq!(app.world().resource::<RosterLoadStatus>().loads, 1);
    assert_eq!(app.world().resource::<LiveRenderables>().len(), 4);

    app.world_mut().send_event(EngineTeardown);
    app.update();

    assert!(!app.world().non_send_resource::<RosterWatcher>().is_watching());
    assert!(app.world().resource::<LiveRenderables>().is_empty());
}

#[test]
fn test_app_exit_tears_down() {
    let mut app = test_app(AgentRoster::seeded());
    app.update();
    assert_eq!(app.world().resource::<LiveRenderables>().len(), 3);

    app.world_mut().send_event(AppExit::Success);
    app.update();

    assert_eq!(
        *app.world().resource::<EngineLifecycle>(),
        EngineLifecycle::TornDown
    );
    assert!(app.world().resource::<LiveRenderables>().is_empty());
}
