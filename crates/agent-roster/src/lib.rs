//! Agent records and the agent store for the office visualization.
//!
//! This crate contains pure data structures with no rendering logic.
//! The `agent-viz` engine reads it through [`RosterSnapshot`] and talks back
//! only through [`AgentRoster::select`].

pub mod agent;
pub mod roster;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export agent types
pub use agent::{Agent, AgentId, AgentState, AgentVariant};

// Re-export store types
pub use roster::{
    AgentRoster, AgentUpdate, RosterError, RosterSnapshot, RosterStats, AVAILABLE_SLOTS,
    NEW_AGENT_COLOR,
};
