//! Roster loading and file watching.
//!
//! When a roster file is given, it replaces the store's agents at startup and
//! again every time the file changes on disk. `R` forces a reload.

use agent_roster::AgentRoster;
use bevy::prelude::*;
use notify::{Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;

use crate::lifecycle::{engine_running, teardown_engine, EngineLifecycle, EngineSet};
use crate::store::AgentStore;

/// Plugin for loading the roster from a watched file.
pub struct RosterLoaderPlugin;

impl Plugin for RosterLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RosterSource>()
            .init_resource::<RosterLoadStatus>()
            .init_non_send_resource::<RosterWatcher>()
            .add_systems(
                Update,
                (check_roster_updates, handle_reload_key)
                    .chain()
                    .in_set(EngineSet::Input)
                    .run_if(engine_running),
            )
            .add_systems(Last, release_roster_watcher.after(teardown_engine));
    }
}

/// Roster file to load, if any.
#[derive(Resource, Debug, Clone, Default)]
pub struct RosterSource {
    pub path: Option<PathBuf>,
}

/// Outcome of the most recent roster load.
#[derive(Resource, Debug, Default)]
pub struct RosterLoadStatus {
    /// When the roster was last loaded successfully.
    pub last_update: Option<Instant>,
    /// Any error from the last load attempt.
    pub last_error: Option<String>,
    /// Successful loads so far.
    pub loads: u32,
}

/// File watching state, held as a non-send resource so teardown can drop it.
#[derive(Default)]
pub struct RosterWatcher {
    /// The watcher instance.
    watcher: Option<RecommendedWatcher>,
    /// Receiver for file change events.
    rx: Option<Receiver<Result<NotifyEvent, notify::Error>>>,
    /// Whether we've initialized.
    initialized: bool,
}

impl RosterWatcher {
    /// Whether a watcher is running.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Start watching the roster's directory and do the initial load.
    fn ensure_initialized(
        &mut self,
        path: &Path,
        store: &mut AgentStore,
        status: &mut RosterLoadStatus,
    ) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let watch_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let (tx, rx) = channel();
        match RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        ) {
            Ok(mut watcher) => {
                if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
                    tracing::warn!("Failed to watch directory {:?}: {}", watch_dir, e);
                } else {
                    tracing::info!("Watching roster directory: {:?}", watch_dir);
                }
                self.watcher = Some(watcher);
                self.rx = Some(rx);
            }
            Err(e) => {
                tracing::error!("Failed to create file watcher: {}", e);
            }
        }

        if path.exists() {
            reload_store(path, store, status);
        } else {
            tracing::info!("Roster file {:?} does not exist yet", path);
        }
    }
}

/// System to reload the roster when its file changes.
fn check_roster_updates(
    mut watcher: NonSendMut<RosterWatcher>,
    source: Res<RosterSource>,
    mut store: ResMut<AgentStore>,
    mut status: ResMut<RosterLoadStatus>,
) {
    let Some(path) = source.path.as_deref() else {
        return;
    };
    watcher.ensure_initialized(path, &mut store, &mut status);

    let Some(ref rx) = watcher.rx else {
        return;
    };

    let mut changed = false;
    while let Ok(result) = rx.try_recv() {
        match result {
            Ok(event) => {
                let is_relevant = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == path.file_name());
                if is_relevant
                    && matches!(
                        event.kind,
                        notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                    )
                {
                    tracing::debug!("Detected roster change: {:?}", event.paths);
                    changed = true;
                }
            }
            Err(e) => {
                tracing::warn!("File watcher error: {}", e);
            }
        }
    }

    // Editors often emit several events per save.
    if changed {
        reload_store(path, &mut store, &mut status);
    }
}

/// System to stop watching once the engine is torn down.
fn release_roster_watcher(
    lifecycle: Res<EngineLifecycle>,
    mut watcher: NonSendMut<RosterWatcher>,
) {
    if *lifecycle != EngineLifecycle::TornDown || !watcher.initialized {
        return;
    }
    if watcher.watcher.take().is_some() {
        tracing::info!("Stopped watching roster file");
    }
    watcher.rx = None;
}

/// System to force a reload with the R key.
fn handle_reload_key(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    source: Res<RosterSource>,
    mut store: ResMut<AgentStore>,
    mut status: ResMut<RosterLoadStatus>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    if !keyboard.just_pressed(KeyCode::KeyR) {
        return;
    }
    if let Some(path) = source.path.as_deref() {
        tracing::info!("Manual roster reload triggered");
        reload_store(path, &mut store, &mut status);
    }
}

/// Replace the store's agents with the file's. Returns `true` on success.
///
/// A failed load leaves the store untouched.
pub fn reload_store(path: &Path, store: &mut AgentStore, status: &mut RosterLoadStatus) -> bool {
    let result = AgentRoster::load(path)
        .and_then(|loaded| store.replace_agents(loaded.agents().to_vec()));
    match result {
        Ok(()) => {
            status.last_update = Some(Instant::now());
            status.last_error = None;
            status.loads += 1;
            tracing::info!(
                "Loaded roster from {:?} ({} agents, revision {})",
                path,
                store.agents().len(),
                store.revision()
            );
            true
        }
        Err(e) => {
            tracing::warn!("Failed to load roster from {:?}: {}", path, e);
            status.last_error = Some(e.to_string());
            false
        }
    }
}
