//! The agent store.
//!
//! `AgentRoster` owns the ordered agent list and the current selection. Every
//! mutation bumps a revision counter. Snapshots share the agent list through
//! an `Arc`, so a snapshot taken at the start of a frame stays stable even if
//! the roster is mutated while the frame is still running.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::agent::{Agent, AgentId, AgentState, AgentVariant};

/// Floor slots handed out to agents created at runtime, as `(x, z)`.
pub const AVAILABLE_SLOTS: [(f32, f32); 10] = [
    (6.0, 0.0),
    (-6.0, 0.0),
    (0.0, 3.0),
    (3.0, 3.0),
    (-3.0, 3.0),
    (6.0, 3.0),
    (-6.0, 3.0),
    (0.0, -6.0),
    (3.0, -6.0),
    (-3.0, -6.0),
];

/// Display color for agents created at runtime.
pub const NEW_AGENT_COLOR: &str = "#A78BFA";

/// Errors raised while loading or validating a roster.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse roster JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate agent id '{0}'")]
    DuplicateId(AgentId),
}

/// Partial update applied by [`AgentRoster::update_agent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<AgentState>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "color")]
    pub display_color: Option<String>,
}

/// Counters shown on the office status board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterStats {
    /// Every agent in the roster.
    pub agents_online: usize,
    /// Agents that are active, thinking, or working.
    pub tasks_running: usize,
    /// Agents in the error state.
    pub errors: usize,
}

impl RosterStats {
    /// Compute the counters for a list of agents.
    pub fn from_agents<'a>(agents: impl IntoIterator<Item = &'a Agent>) -> Self {
        let mut stats = Self::default();
        for agent in agents {
            stats.agents_online += 1;
            if agent.state.is_busy() {
                stats.tasks_running += 1;
            }
            if agent.state == AgentState::Error {
                stats.errors += 1;
            }
        }
        stats
    }
}

/// Immutable view of the roster at one revision.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    revision: u64,
    agents: Arc<Vec<Agent>>,
}

impl RosterSnapshot {
    /// Wrap an agent list produced outside an [`AgentRoster`].
    ///
    /// No validation is done here; consumers must tolerate duplicate ids.
    pub fn from_agents(revision: u64, agents: Vec<Agent>) -> Self {
        Self {
            revision,
            agents: Arc::new(agents),
        }
    }

    /// Revision of the roster this snapshot was taken from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Agents in store order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Iterate agents in store order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Ids present in this snapshot.
    pub fn ids(&self) -> HashSet<&str> {
        self.agents.iter().map(|a| a.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Status board counters for this snapshot.
    pub fn stats(&self) -> RosterStats {
        RosterStats::from_agents(self.agents.iter())
    }
}

/// The agent store: ordered agents plus selection.
#[derive(Debug, Clone, Default)]
pub struct AgentRoster {
    agents: Arc<Vec<Agent>>,
    selected: Option<AgentId>,
    revision: u64,
}

impl AgentRoster {
    /// Create a roster from a list of agents, rejecting duplicate ids.
    pub fn new(agents: Vec<Agent>) -> Result<Self, RosterError> {
        validate_unique(&agents)?;
        Ok(Self {
            agents: Arc::new(agents),
            selected: None,
            revision: 0,
        })
    }

    /// The three agents the office starts with.
    pub fn seeded() -> Self {
        Self {
            agents: Arc::new(vec![
                Agent::new(
                    "1",
                    "Sleepy",
                    AgentVariant::Sleepy,
                    AgentState::Sleeping,
                    [-3.0, 0.0, 0.0],
                    "#60A5FA",
                ),
                Agent::new(
                    "2",
                    "Joy",
                    AgentVariant::Joy,
                    AgentState::Active,
                    [0.0, 0.0, -3.0],
                    "#4ADE80",
                ),
                Agent::new(
                    "3",
                    "Glitch",
                    AgentVariant::Glitch,
                    AgentState::Error,
                    [3.0, 0.0, 0.0],
                    "#F87171",
                ),
            ]),
            selected: None,
            revision: 0,
        }
    }

    /// Parse a roster from a JSON array of agents.
    pub fn from_json(json: &str) -> Result<Self, RosterError> {
        let agents: Vec<Agent> = serde_json::from_str(json)?;
        Self::new(agents)
    }

    /// Load a roster from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize the agent list as pretty JSON.
    pub fn to_json(&self) -> Result<String, RosterError> {
        Ok(serde_json::to_string_pretty(self.agents.as_ref())?)
    }

    /// Take a snapshot of the current agent list.
    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            revision: self.revision,
            agents: Arc::clone(&self.agents),
        }
    }

    /// Agents in store order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Monotonic counter bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Currently selected agent id.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select an agent. Unknown ids are ignored; returns whether the selection
    /// now points at `id`.
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            tracing::warn!("Ignoring selection of unknown agent {}", id);
            return false;
        }
        if self.selected.as_deref() != Some(id) {
            self.selected = Some(id.to_string());
            self.revision += 1;
        }
        true
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.revision += 1;
        }
    }

    /// Apply a partial update to one agent. Returns false if the id is unknown.
    pub fn update_agent(&mut self, id: &str, update: AgentUpdate) -> bool {
        let agents = Arc::make_mut(&mut self.agents);
        let Some(agent) = agents.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        if let Some(name) = update.name {
            agent.name = name;
        }
        if let Some(state) = update.state {
            agent.state = state;
        }
        if let Some(color) = update.display_color {
            agent.display_color = color;
        }
        self.revision += 1;
        true
    }

    /// Change one agent's behavioral state.
    pub fn update_state(&mut self, id: &str, state: AgentState) -> bool {
        self.update_agent(
            id,
            AgentUpdate {
                state: Some(state),
                ..Default::default()
            },
        )
    }

    /// Append a new agent at the first free floor slot and return its id.
    ///
    /// When every slot is taken the agent is placed at the origin.
    pub fn add_agent(&mut self) -> AgentId {
        let occupied: Vec<(f32, f32)> = self.agents.iter().map(Agent::floor_position).collect();
        let (x, z) = AVAILABLE_SLOTS
            .iter()
            .copied()
            .find(|slot| !occupied.contains(slot))
            .unwrap_or((0.0, 0.0));

        let id = format!("agent-{}", uuid::Uuid::new_v4().simple());
        Arc::make_mut(&mut self.agents).push(Agent::new(
            id.clone(),
            "New Agent",
            AgentVariant::New,
            AgentState::Active,
            [x, 0.0, z],
            NEW_AGENT_COLOR,
        ));
        self.revision += 1;
        tracing::info!("Added agent {} at ({}, {})", id, x, z);
        id
    }

    /// Remove an agent, clearing the selection if it pointed at it.
    pub fn remove_agent(&mut self, id: &str) -> bool {
        let agents = Arc::make_mut(&mut self.agents);
        let before = agents.len();
        agents.retain(|a| a.id != id);
        if agents.len() == before {
            return false;
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.revision += 1;
        true
    }

    /// Replace the whole agent list, keeping the selection if it survives.
    pub fn replace_agents(&mut self, agents: Vec<Agent>) -> Result<(), RosterError> {
        validate_unique(&agents)?;
        if let Some(selected) = &self.selected {
            if !agents.iter().any(|a| &a.id == selected) {
                self.selected = None;
            }
        }
        self.agents = Arc::new(agents);
        self.revision += 1;
        Ok(())
    }

    /// Status board counters.
    pub fn stats(&self) -> RosterStats {
        RosterStats::from_agents(self.agents.iter())
    }
}

fn validate_unique(agents: &[Agent]) -> Result<(), RosterError> {
    let mut seen = HashSet::new();
    for agent in agents {
        if !seen.insert(agent.id.as_str()) {
            return Err(RosterError::DuplicateId(agent.id.clone()));
        }
    }
    Ok(())
}
