//! Hover bubble state: which agent is under the pointer and what it says.

use agent_roster::{AgentId, AgentVariant};
use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

use crate::lifecycle::{engine_running, EngineRng, EngineSet};
use crate::reconcile::{reconcile_renderables, LiveRenderables};

/// Plugin for hover bubble state.
pub struct HoverPlugin;

impl Plugin for HoverPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HoverBubble>()
            .add_event::<HoverChanged>()
            .add_systems(
                Update,
                (
                    drop_stale_hover
                        .in_set(EngineSet::Reconcile)
                        .after(reconcile_renderables),
                    tick_hover_reroll.in_set(EngineSet::Present),
                )
                    .run_if(engine_running),
            );
    }
}

const SLEEPY_PHRASES: [&str; 5] = [
    "Just 5 more minutes...",
    "I'm still waking up...",
    "Dreaming of code...",
    "Zzz... coffee please...",
    "So sleepy...",
];

const JOY_PHRASES: [&str; 5] = [
    "Let's build something!",
    "I'm ready!",
    "This is fun!",
    "Yay! New project!",
    "I love coding!",
];

const GLITCH_PHRASES: [&str; 5] = [
    "Something feels off...",
    "Wait... what?",
    "Error... maybe?",
    "Did I do that?",
    "Oops! Bug detected...",
];

const DEFAULT_PHRASES: [&str; 5] = [
    "Hello there!",
    "Ready to work!",
    "Nice office, right?",
    "Let's get started!",
    "What's the task?",
];

/// Phrase set for a variant; unrecognized variants use the default set.
pub fn phrases_for(variant: AgentVariant) -> &'static [&'static str] {
    match variant {
        AgentVariant::Sleepy => &SLEEPY_PHRASES,
        AgentVariant::Joy => &JOY_PHRASES,
        AgentVariant::Glitch => &GLITCH_PHRASES,
        AgentVariant::New | AgentVariant::Unknown => &DEFAULT_PHRASES,
    }
}

/// Reactive state read by the message bubble UI.
#[derive(Resource, Debug, Clone)]
pub struct HoverBubble {
    agent_id: Option<AgentId>,
    variant: Option<AgentVariant>,
    screen_pos: Option<Vec2>,
    message: Option<&'static str>,
    reroll: Option<Timer>,
    reroll_secs: f32,
}

impl Default for HoverBubble {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl HoverBubble {
    /// Empty bubble that rerolls its message every `reroll_secs`.
    ///
    /// A non-positive or non-finite interval falls back to 3 s.
    pub fn new(reroll_secs: f32) -> Self {
        let reroll_secs = if reroll_secs.is_finite() && reroll_secs > 0.0 {
            reroll_secs
        } else {
            tracing::warn!("Invalid hover reroll interval {}, using 3s", reroll_secs);
            3.0
        };
        Self {
            agent_id: None,
            variant: None,
            screen_pos: None,
            message: None,
            reroll: None,
            reroll_secs,
        }
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn variant(&self) -> Option<AgentVariant> {
        self.variant
    }

    pub fn screen_pos(&self) -> Option<Vec2> {
        self.screen_pos
    }

    pub fn message(&self) -> Option<&'static str> {
        self.message
    }

    pub fn is_hovering(&self) -> bool {
        self.agent_id.is_some()
    }

    /// Whether a reroll timer is pending.
    pub fn reroll_pending(&self) -> bool {
        self.reroll.is_some()
    }

    /// Record a pointer-move hit. Returns `true` when the hovered agent
    /// changed.
    pub fn observe_hit(
        &mut self,
        agent_id: &str,
        variant: AgentVariant,
        screen_pos: Vec2,
        rng: &mut impl Rng,
    ) -> bool {
        self.screen_pos = Some(screen_pos);
        if self.agent_id.as_deref() == Some(agent_id) {
            return false;
        }

        self.agent_id = Some(agent_id.to_string());
        self.variant = Some(variant);
        self.message = phrases_for(variant).choose(rng).copied();
        self.reroll = Some(Timer::from_seconds(self.reroll_secs, TimerMode::Repeating));
        true
    }

    /// Record a pointer-move miss. Returns `true` when something was hovered.
    pub fn observe_miss(&mut self) -> bool {
        let was_hovering = self.is_hovering();
        self.clear();
        was_hovering
    }

    /// Drop the hovered agent and cancel the reroll timer.
    pub fn clear(&mut self) {
        self.agent_id = None;
        self.variant = None;
        self.screen_pos = None;
        self.message = None;
        self.reroll = None;
    }

    /// Advance the reroll timer. Returns `true` when a new message was picked.
    pub fn tick(&mut self, delta: Duration, rng: &mut impl Rng) -> bool {
        let (Some(timer), Some(variant)) = (self.reroll.as_mut(), self.variant) else {
            return false;
        };
        timer.tick(delta);
        if !timer.just_finished() {
            return false;
        }
        self.message = phrases_for(variant).choose(rng).copied();
        true
    }
}

/// Fired only when the hovered agent changes.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct HoverChanged {
    pub agent_id: Option<AgentId>,
}

/// System to reroll the hover message while hover persists.
fn tick_hover_reroll(time: Res<Time>, mut hover: ResMut<HoverBubble>, mut rng: ResMut<EngineRng>) {
    if !hover.reroll_pending() {
        return;
    }
    if hover.tick(time.delta(), &mut rng.0) {
        tracing::trace!("Rerolled hover message: {:?}", hover.message());
    }
}

/// System to clear hover when its renderable was removed this tick.
fn drop_stale_hover(
    live: Res<LiveRenderables>,
    mut hover: ResMut<HoverBubble>,
    mut changes: EventWriter<HoverChanged>,
) {
    let Some(agent_id) = hover.agent_id() else {
        return;
    };
    if live.contains(agent_id) {
        return;
    }
    tracing::debug!("Hovered agent {} left the scene", agent_id);
    hover.clear();
    changes.send(HoverChanged { agent_id: None });
}
