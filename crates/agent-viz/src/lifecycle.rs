//! Frame ordering, shared engine resources, and teardown.
//!
//! One frame runs the engine sets in a fixed order:
//! input → snapshot → reconcile → animate → interact → present.
//! Teardown flips the lifecycle to `TornDown`, which gates every engine
//! system off, and releases renderables, timers, and pending input together.

use bevy::app::AppExit;
use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::hover::HoverBubble;
use crate::pointer::{PointerEvent, PointerSession};
use crate::reconcile::LiveRenderables;
use crate::status::StatusBoard;

/// Plugin for frame ordering and teardown.
pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<EngineRng>() {
            app.insert_resource(EngineRng::from_entropy());
        }

        app.init_resource::<EngineLifecycle>()
            .add_event::<EngineTeardown>()
            .configure_sets(
                Update,
                (
                    EngineSet::Input,
                    EngineSet::Snapshot,
                    EngineSet::Reconcile,
                    EngineSet::Animate,
                    EngineSet::Interact,
                    EngineSet::Present,
                )
                    .chain(),
            )
            .add_systems(Last, teardown_engine);
    }
}

/// Ordered stages of one engine frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineSet {
    /// Window input is translated into pointer events.
    Input,
    /// The store is captured into the frame snapshot.
    Snapshot,
    /// Renderables are added and removed to match the snapshot.
    Reconcile,
    /// Renderables are posed from their agents' states.
    Animate,
    /// Pointer events are resolved into hover and selection.
    Interact,
    /// Engine state is pushed to materials, UI, and the store.
    Present,
}

/// Whether the engine is still ticking.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineLifecycle {
    #[default]
    Running,
    TornDown,
}

/// Run condition for every engine system.
pub fn engine_running(lifecycle: Res<EngineLifecycle>) -> bool {
    *lifecycle == EngineLifecycle::Running
}

/// Request teardown without exiting the app.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct EngineTeardown;

/// Random source for phases, jitter, and hover messages.
#[derive(Resource, Debug, Clone)]
pub struct EngineRng(pub SmallRng);

impl EngineRng {
    /// Deterministic RNG for reproducible runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(SmallRng::from_entropy())
    }
}

/// System to tear the engine down on request or app exit.
#[allow(clippy::too_many_arguments)]
pub fn teardown_engine(
    mut commands: Commands,
    mut requests: EventReader<EngineTeardown>,
    mut exits: EventReader<AppExit>,
    mut lifecycle: ResMut<EngineLifecycle>,
    mut live: ResMut<LiveRenderables>,
    mut hover: ResMut<HoverBubble>,
    mut status: ResMut<StatusBoard>,
    mut session: ResMut<PointerSession>,
    mut pointer_events: ResMut<Events<PointerEvent>>,
) {
    let requested = requests.read().count() > 0;
    let exiting = exits.read().count() > 0;
    if !(requested || exiting) || *lifecycle == EngineLifecycle::TornDown {
        return;
    }

    let mut released = 0;
    for (_, entity) in live.drain() {
        commands.entity(entity).despawn_recursive();
        released += 1;
    }
    hover.clear();
    status.cancel();
    session.reset();
    pointer_events.clear();
    *lifecycle = EngineLifecycle::TornDown;

    tracing::info!("Engine torn down: released {} renderables", released);
}
