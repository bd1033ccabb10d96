//! Entity reconciliation: keeps exactly one renderable per live agent id.

use agent_roster::{AgentId, AgentVariant, RosterSnapshot};
use bevy::prelude::*;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use crate::animation::Motion;
use crate::factory::{build_template, spawn_renderable, FactoryError};
use crate::lifecycle::{engine_running, EngineRng, EngineSet};
use crate::store::FrameSnapshot;

/// Plugin for renderable reconciliation.
pub struct ReconcilePlugin;

impl Plugin for ReconcilePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LiveRenderables>().add_systems(
            Update,
            reconcile_renderables
                .in_set(EngineSet::Reconcile)
                .run_if(engine_running),
        );
    }
}

/// Component on the root entity of every renderable.
#[derive(Component, Debug)]
pub struct Renderable {
    agent_id: AgentId,
    variant: AgentVariant,
    base: Vec3,
    phase: f32,
    rig: RenderableRig,
    /// Smoothed motion carried between frames.
    pub motion: Motion,
}

/// Child entities and material handles the animation writes to.
#[derive(Debug, Clone)]
pub struct RenderableRig {
    pub thought: Entity,
    pub glow: Entity,
    pub head_material: Handle<StandardMaterial>,
    pub glow_material: Handle<StandardMaterial>,
    pub accent: Srgba,
    pub display: Srgba,
}

impl Renderable {
    pub fn new(
        agent_id: AgentId,
        variant: AgentVariant,
        base: Vec3,
        phase: f32,
        rig: RenderableRig,
    ) -> Self {
        Self {
            agent_id,
            variant,
            base,
            phase,
            rig,
            motion: Motion::default(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Variant the renderable was built from.
    pub fn variant(&self) -> AgentVariant {
        self.variant
    }

    /// Rest position fixed at creation.
    pub fn base(&self) -> Vec3 {
        self.base
    }

    /// Per-entity time offset in `[0, 2π)`, fixed at creation.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn rig(&self) -> &RenderableRig {
        &self.rig
    }
}

/// Resource mapping agent ids to their renderable root entities.
#[derive(Resource, Debug, Default)]
pub struct LiveRenderables {
    map: HashMap<AgentId, Entity>,
    /// Agents the factory refused, with the last reason logged.
    rejected: HashMap<AgentId, String>,
    /// Factory failures logged so far.
    rejections_logged: usize,
}

impl LiveRenderables {
    /// Get the entity for an agent.
    pub fn get(&self, agent_id: &str) -> Option<Entity> {
        self.map.get(agent_id).copied()
    }

    pub fn insert(&mut self, agent_id: impl Into<AgentId>, entity: Entity) {
        self.map.insert(agent_id.into(), entity);
    }

    pub fn remove(&mut self, agent_id: &str) -> Option<Entity> {
        self.map.remove(agent_id)
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.map.contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Ids with a live renderable.
    pub fn ids(&self) -> HashSet<&str> {
        self.map.keys().map(String::as_str).collect()
    }

    /// Last logged factory failure for an agent.
    pub fn rejection(&self, agent_id: &str) -> Option<&str> {
        self.rejected.get(agent_id).map(String::as_str)
    }

    /// Factory failures logged so far.
    pub fn rejections_logged(&self) -> usize {
        self.rejections_logged
    }

    /// Record a factory failure. Returns `true` when it differs from the
    /// failure last recorded for the agent and should be logged.
    pub fn note_rejection(&mut self, agent_id: &str, err: &FactoryError) -> bool {
        let reason = err.to_string();
        if self.rejected.get(agent_id) == Some(&reason) {
            return false;
        }
        self.rejected.insert(agent_id.to_string(), reason);
        self.rejections_logged += 1;
        true
    }

    /// Remove every mapping, yielding the entities.
    pub fn drain(&mut self) -> impl Iterator<Item = (AgentId, Entity)> + '_ {
        self.rejected.clear();
        self.map.drain()
    }
}

/// Difference between the live set and a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Live ids missing from the snapshot.
    pub removed: Vec<AgentId>,
    /// Snapshot ids without a renderable, in snapshot order.
    pub added: Vec<AgentId>,
    /// Repeated ids in the snapshot; only the first occurrence counts.
    pub duplicates: Vec<AgentId>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Compute `removed = L − S` and `added = S − L`.
pub fn plan_reconciliation(live: &LiveRenderables, snapshot: &RosterSnapshot) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(snapshot.len());

    for agent in snapshot.iter() {
        if !seen.insert(agent.id.as_str()) {
            plan.duplicates.push(agent.id.clone());
            continue;
        }
        if !live.contains(&agent.id) {
            plan.added.push(agent.id.clone());
        }
    }

    let mut removed: Vec<AgentId> = live
        .map
        .keys()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect();
    removed.sort();
    plan.removed = removed;

    plan
}

/// System to add and remove renderables so the live set matches the snapshot.
pub fn reconcile_renderables(
    mut commands: Commands,
    snapshot: Res<FrameSnapshot>,
    mut live: ResMut<LiveRenderables>,
    mut rng: ResMut<EngineRng>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let plan = plan_reconciliation(&live, &snapshot);

    for id in &plan.duplicates {
        tracing::debug!("Ignoring duplicate agent id {} in snapshot", id);
    }

    live.rejected.retain(|id, _| snapshot.get(id).is_some());

    if plan.is_empty() {
        return;
    }

    for id in &plan.removed {
        if let Some(entity) = live.remove(id) {
            commands.entity(entity).despawn_recursive();
        }
    }

    let mut spawned = 0;
    for id in &plan.added {
        // First occurrence wins for duplicated ids.
        let Some(agent) = snapshot.get(id) else {
            continue;
        };
        match build_template(agent) {
            Ok(template) => {
                let phase = rng.0.gen_range(0.0..TAU);
                let entity =
                    spawn_renderable(&mut commands, &mut meshes, &mut materials, template, phase);
                live.insert(id.clone(), entity);
                live.rejected.remove(id);
                spawned += 1;
            }
            Err(err) => {
                if live.note_rejection(id, &err) {
                    tracing::warn!("Skipping agent {}: {}", id, err);
                }
            }
        }
    }

    if spawned > 0 || !plan.removed.is_empty() {
        tracing::debug!(
            "Reconciled revision {}: +{} -{} ({} live)",
            snapshot.revision(),
            spawned,
            plan.removed.len(),
            live.len()
        );
    }
}
