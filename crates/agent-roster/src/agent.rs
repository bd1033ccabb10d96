//! Agent records as the store exposes them.
//!
//! These are plain data structures. The visualization engine reads them
//! through a [`crate::RosterSnapshot`] and never mutates them.

use serde::{Deserialize, Serialize};

/// Stable agent identifier.
pub type AgentId = String;

/// Behavioral state of an agent; the only field the engine reads every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Sleeping,
    #[default]
    Active,
    Thinking,
    Working,
    Error,
}

impl AgentState {
    /// All states in display order.
    pub const ALL: [AgentState; 5] = [
        AgentState::Sleeping,
        AgentState::Active,
        AgentState::Thinking,
        AgentState::Working,
        AgentState::Error,
    ];

    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Sleeping => "sleeping",
            AgentState::Active => "active",
            AgentState::Thinking => "thinking",
            AgentState::Working => "working",
            AgentState::Error => "error",
        }
    }

    /// Whether the agent counts as running a task on the status board.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            AgentState::Active | AgentState::Thinking | AgentState::Working
        )
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual kind of an agent, fixed for its lifetime.
///
/// Unrecognized kinds deserialize to [`AgentVariant::Unknown`] so a roster
/// written by a newer store still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentVariant {
    Sleepy,
    Joy,
    Glitch,
    /// Agents created at runtime through [`crate::AgentRoster::add_agent`].
    New,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AgentVariant {
    /// Wire name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentVariant::Sleepy => "sleepy",
            AgentVariant::Joy => "joy",
            AgentVariant::Glitch => "glitch",
            AgentVariant::New => "new",
            AgentVariant::Unknown => "unknown",
        }
    }
}

/// One agent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Visual kind.
    #[serde(rename = "type", default)]
    pub variant: AgentVariant,
    /// Current behavioral state.
    #[serde(default)]
    pub state: AgentState,
    /// Home location in world units, `[x, y, z]`.
    #[serde(rename = "position")]
    pub anchor_position: [f32; 3],
    /// Display color as `#RRGGBB`.
    #[serde(rename = "color")]
    pub display_color: String,
}

impl Agent {
    /// Create a new agent record.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        variant: AgentVariant,
        state: AgentState,
        anchor_position: [f32; 3],
        display_color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variant,
            state,
            anchor_position,
            display_color: display_color.into(),
        }
    }

    /// Anchor position on the floor plane, `(x, z)`.
    pub fn floor_position(&self) -> (f32, f32) {
        (self.anchor_position[0], self.anchor_position[2])
    }
}
