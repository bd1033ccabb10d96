//! Agent visualization engine: Bevy plugins that keep a 3D scene of robots in
//! step with an agent roster, animate them from their states, and resolve
//! pointer input into hover and selection.

pub mod animation;
pub mod camera;
pub mod config;
pub mod debug;
pub mod factory;
pub mod hover;
pub mod lifecycle;
pub mod overlay;
pub mod picking;
pub mod plugin;
pub mod pointer;
pub mod reconcile;
pub mod roster_loader;
pub mod status;
pub mod store;
pub mod world;

pub use plugin::{AgentEnginePlugin, AgentVizPlugin};
