//! Office status board counters, refreshed on a fixed interval.

use agent_roster::RosterStats;
use bevy::prelude::*;
use std::time::Duration;

use crate::lifecycle::{engine_running, EngineSet};
use crate::store::FrameSnapshot;

/// Plugin for the status board counters.
pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StatusBoard>().add_systems(
            Update,
            refresh_status_board
                .in_set(EngineSet::Present)
                .run_if(engine_running),
        );
    }
}

/// Counters shown on the status board.
#[derive(Resource, Debug, Clone)]
pub struct StatusBoard {
    stats: RosterStats,
    refresh: Option<Timer>,
    refresh_secs: f32,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl StatusBoard {
    /// Board that refreshes every `refresh_secs`; a non-positive or
    /// non-finite interval falls back to 2 s.
    pub fn new(refresh_secs: f32) -> Self {
        let refresh_secs = if refresh_secs.is_finite() && refresh_secs > 0.0 {
            refresh_secs
        } else {
            tracing::warn!("Invalid status refresh interval {}, using 2s", refresh_secs);
            2.0
        };
        Self {
            stats: RosterStats::default(),
            refresh: None,
            refresh_secs,
        }
    }

    pub fn stats(&self) -> RosterStats {
        self.stats
    }

    /// Whether the refresh timer is running.
    pub fn is_scheduled(&self) -> bool {
        self.refresh.is_some()
    }

    /// Advance the board. The first call computes immediately and starts the
    /// refresh timer. Returns `true` when the counters were recomputed.
    pub fn tick(&mut self, delta: Duration, compute: impl FnOnce() -> RosterStats) -> bool {
        match self.refresh.as_mut() {
            None => {
                self.refresh = Some(Timer::from_seconds(self.refresh_secs, TimerMode::Repeating));
            }
            Some(timer) => {
                timer.tick(delta);
                if !timer.just_finished() {
                    return false;
                }
            }
        }
        self.stats = compute();
        true
    }

    /// Stop refreshing.
    pub fn cancel(&mut self) {
        self.refresh = None;
    }
}

/// System to recompute the counters from the frame snapshot.
fn refresh_status_board(
    time: Res<Time>,
    snapshot: Res<FrameSnapshot>,
    mut board: ResMut<StatusBoard>,
) {
    // Only a recompute counts as a change for the UI.
    if board
        .bypass_change_detection()
        .tick(time.delta(), || snapshot.stats())
    {
        board.set_changed();
        tracing::trace!("Status board: {:?}", board.stats());
    }
}
