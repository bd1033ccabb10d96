//! The agent store as seen by the engine.
//!
//! The store itself lives in `agent-roster`; this module wraps it as a Bevy
//! resource, captures one snapshot per frame, and forwards selection
//! signals back to it.

use agent_roster::{AgentId, AgentRoster, RosterSnapshot};
use bevy::prelude::*;

use crate::lifecycle::{engine_running, EngineSet};

/// Plugin that connects the engine to the agent store.
pub struct StorePlugin;

impl Plugin for StorePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<AgentStore>() {
            app.insert_resource(AgentStore(AgentRoster::seeded()));
        }

        app.init_resource::<FrameSnapshot>()
            .add_event::<AgentSelected>()
            .add_systems(
                Update,
                (
                    capture_snapshot.in_set(EngineSet::Snapshot),
                    apply_selection.in_set(EngineSet::Present),
                )
                    .run_if(engine_running),
            );
    }
}

/// The externally-owned agent store.
#[derive(Resource, Debug, Default, Deref, DerefMut)]
pub struct AgentStore(pub AgentRoster);

/// Snapshot every engine stage reads during one frame.
#[derive(Resource, Debug, Default, Deref)]
pub struct FrameSnapshot(pub RosterSnapshot);

/// Selection signal emitted by a click on an agent.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AgentSelected {
    pub agent_id: AgentId,
}

/// System to capture the store into this frame's snapshot.
fn capture_snapshot(store: Res<AgentStore>, mut frame: ResMut<FrameSnapshot>) {
    if frame.revision() != store.revision() || frame.len() != store.agents().len() {
        tracing::debug!(
            "Captured roster revision {} ({} agents)",
            store.revision(),
            store.agents().len()
        );
    }
    frame.0 = store.snapshot();
}

/// System to forward selection signals to the store.
fn apply_selection(mut store: ResMut<AgentStore>, mut selections: EventReader<AgentSelected>) {
    for selection in selections.read() {
        if store.select(&selection.agent_id) {
            tracing::info!("Selected agent {}", selection.agent_id);
        }
    }
}
