//! Plugins that tie the engine and the windowed app together.

use bevy::prelude::*;

use crate::animation::{AnimationPlugin, Smoothing};
use crate::camera::{CameraPlugin, OrbitCamera};
use crate::config::VizConfig;
use crate::debug::DebugPlugin;
use crate::hover::{HoverBubble, HoverPlugin};
use crate::lifecycle::{engine_running, EngineRng, EngineSet, LifecyclePlugin};
use crate::overlay::{BubbleLayout, OverlayPlugin};
use crate::pointer::{
    forward_window_input, sync_pick_viewport, update_cursor_icon, PointerPlugin, PointerSettings,
};
use crate::reconcile::ReconcilePlugin;
use crate::roster_loader::RosterLoaderPlugin;
use crate::status::{StatusBoard, StatusPlugin};
use crate::store::StorePlugin;
use crate::world::WorldPlugin;

/// The engine without any window, camera, or UI.
///
/// Runs under `MinimalPlugins` as long as `Assets<Mesh>` and
/// `Assets<StandardMaterial>` exist.
pub struct AgentEnginePlugin;

impl Plugin for AgentEnginePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            LifecyclePlugin,
            StorePlugin,
            ReconcilePlugin,
            AnimationPlugin,
            PointerPlugin,
            HoverPlugin,
            StatusPlugin,
        ));
    }
}

/// Main plugin for the windowed agent office.
///
/// Inserts the engine resources derived from the configuration, then sets up
/// the window and adds all sub-plugins.
pub struct AgentVizPlugin {
    pub config: VizConfig,
}

impl Plugin for AgentVizPlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;

        if let Some(seed) = config.animation.seed {
            app.insert_resource(EngineRng::seeded(seed));
        }
        app.insert_resource(Smoothing {
            mode: config.animation.smoothing,
            reference_hz: config.animation.reference_hz,
        })
        .insert_resource(PointerSettings {
            click_threshold_px: config.pointer.click_threshold_px,
        })
        .insert_resource(HoverBubble::new(config.hover.reroll_secs))
        .insert_resource(StatusBoard::new(config.status.refresh_secs))
        .insert_resource(BubbleLayout {
            offset_px: config.hover.bubble_offset_px,
        })
        .insert_resource(OrbitCamera::from_config(&config.camera))
        .insert_resource(config.clone());

        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: config.window.title.clone(),
                resolution: (config.window.width, config.window.height).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            AgentEnginePlugin,
            CameraPlugin,
            WorldPlugin,
            RosterLoaderPlugin,
            OverlayPlugin,
            DebugPlugin,
        ))
        .add_systems(
            Update,
            (
                (forward_window_input, sync_pick_viewport).in_set(EngineSet::Input),
                update_cursor_icon.in_set(EngineSet::Present),
            )
                .run_if(engine_running),
        );
    }
}
