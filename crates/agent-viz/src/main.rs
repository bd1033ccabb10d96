//! Agent office visualization
//!
//! Run with: cargo run -p agent-viz
//!
//! Examples:
//!   cargo run -p agent-viz -- --roster office.json
//!   cargo run -p agent-viz -- --config viz.toml --seed 7 --fixed-step
//!   cargo run -p agent-viz -- --print-config > viz.toml

use agent_viz::config::VizConfig;
use agent_viz::roster_loader::RosterSource;
use agent_viz::AgentVizPlugin;
use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;

/// Agent office visualization
#[derive(Parser, Debug)]
#[command(name = "agent-viz")]
#[command(about = "Animated 3D office of agents with hover and click selection")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON roster file, reloaded whenever it changes
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Random seed for animation phases, jitter, and hover messages
    #[arg(long)]
    seed: Option<u64>,

    /// Apply blend factors once per frame instead of per elapsed time
    #[arg(long)]
    fixed_step: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match VizConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {:?}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => VizConfig::default(),
    };
    config.apply_overrides(args.seed, args.fixed_step);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if args.print_config {
        match config.to_toml() {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize config: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    App::new()
        .insert_resource(RosterSource { path: args.roster })
        .add_plugins(AgentVizPlugin { config })
        .run();
}
