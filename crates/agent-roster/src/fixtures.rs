//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers from other
//! crates.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // agent-roster = { path = "../agent-roster", features = ["test-fixtures"] }
//!
//! use agent_roster::fixtures;
//!
//! let roster = fixtures::sample_roster();
//! let agent = fixtures::agent("a", agent_roster::AgentState::Working, [1.0, 0.0, 1.0]);
//! ```

use crate::{Agent, AgentRoster, AgentState, AgentVariant};

/// Returns the sample roster from the fixtures file.
///
/// Contains 4 agents, one per known variant:
/// - Sleepy (sleeping), Joy (active), Glitch (error), Newbie (working)
pub fn sample_roster() -> AgentRoster {
    let json = include_str!("../tests/fixtures/sample_roster.json");
    AgentRoster::from_json(json).expect("Failed to parse sample_roster.json")
}

/// Build an agent with the `joy` variant and a fixed color.
pub fn agent(id: &str, state: AgentState, position: [f32; 3]) -> Agent {
    Agent::new(id, id, AgentVariant::Joy, state, position, "#4ADE80")
}

/// Build `count` active agents laid out on a row along the x axis.
pub fn row_of_agents(count: usize) -> Vec<Agent> {
    (0..count)
        .map(|i| agent(&format!("agent_{:03}", i), AgentState::Active, [i as f32 * 3.0, 0.0, 0.0]))
        .collect()
}
