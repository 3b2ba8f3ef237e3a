//! Animation state machine component.
//!
//! The companion is always in exactly one [`AnimationState`]. Each state has a
//! static [`StateSpec`]: nominal duration (ticks or looping), whether external
//! triggers may interrupt it, a cycle period and its pose function. The
//! [`AnimationPlayer`] component tracks the active state, time spent in it, the
//! settle progress of falling states and a short queue of follow-up states.
//!
//! # Related
//!
//! - [`crate::systems::statemachine`] – advances the player every tick
//! - [`crate::poses`] – the pose functions referenced by each state

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use super::pose::PoseFn;
use crate::poses;

/// Closed set of animation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    Idle,
    Walking,
    Jumping,
    Celebrating,
    Waving,
    Eating,
    Sleeping,
    WorkingAtDesk,
    LayingOnSide,
    LayingOnFace,
    FallingOnFace,
    TippingOverSide,
    BeingDraggedOnGround,
    Dangling,
    Airborne,
    TakingDamage,
    HappyBounce,
    SleepySlow,
    MischievousGrin,
    AnnoyedGrumpy,
}

/// Nominal length of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateDuration {
    Looping,
    Ticks(u32),
    /// Fixed settle length taken from configuration; not overridable.
    Settle,
}

/// Static behaviour of one state.
#[derive(Clone, Copy)]
pub struct StateSpec {
    pub duration: StateDuration,
    pub interruptible: bool,
    /// Seconds per pose cycle (phase 0 → 1).
    pub cycle_secs: f32,
    pub pose: PoseFn,
}

impl fmt::Debug for StateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSpec")
            .field("duration", &self.duration)
            .field("interruptible", &self.interruptible)
            .field("cycle_secs", &self.cycle_secs)
            .finish()
    }
}

fn spec(duration: StateDuration, interruptible: bool, cycle_secs: f32, pose: PoseFn) -> StateSpec {
    StateSpec {
        duration,
        interruptible,
        cycle_secs,
        pose,
    }
}

impl AnimationState {
    pub const ALL: [AnimationState; 20] = [
        AnimationState::Idle,
        AnimationState::Walking,
        AnimationState::Jumping,
        AnimationState::Celebrating,
        AnimationState::Waving,
        AnimationState::Eating,
        AnimationState::Sleeping,
        AnimationState::WorkingAtDesk,
        AnimationState::LayingOnSide,
        AnimationState::LayingOnFace,
        AnimationState::FallingOnFace,
        AnimationState::TippingOverSide,
        AnimationState::BeingDraggedOnGround,
        AnimationState::Dangling,
        AnimationState::Airborne,
        AnimationState::TakingDamage,
        AnimationState::HappyBounce,
        AnimationState::SleepySlow,
        AnimationState::MischievousGrin,
        AnimationState::AnnoyedGrumpy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Walking => "walking",
            AnimationState::Jumping => "jumping",
            AnimationState::Celebrating => "celebrating",
            AnimationState::Waving => "waving",
            AnimationState::Eating => "eating",
            AnimationState::Sleeping => "sleeping",
            AnimationState::WorkingAtDesk => "working_at_desk",
            AnimationState::LayingOnSide => "laying_on_side",
            AnimationState::LayingOnFace => "laying_on_face",
            AnimationState::FallingOnFace => "falling_on_face",
            AnimationState::TippingOverSide => "tipping_over_side",
            AnimationState::BeingDraggedOnGround => "being_dragged_on_ground",
            AnimationState::Dangling => "dangling",
            AnimationState::Airborne => "airborne",
            AnimationState::TakingDamage => "taking_damage",
            AnimationState::HappyBounce => "happy_bounce",
            AnimationState::SleepySlow => "sleepy_slow",
            AnimationState::MischievousGrin => "mischievous_grin",
            AnimationState::AnnoyedGrumpy => "annoyed_grumpy",
        }
    }

    pub fn spec(self) -> StateSpec {
        use StateDuration::{Looping, Settle, Ticks};
        match self {
            AnimationState::Idle => spec(Looping, true, 2.1, poses::idle),
            AnimationState::Walking => spec(Looping, true, 0.52, poses::walking),
            AnimationState::Jumping => spec(Ticks(60), true, 1.0, poses::jumping),
            AnimationState::Celebrating => spec(Ticks(120), true, 0.5, poses::celebrating),
            AnimationState::Waving => spec(Ticks(90), true, 0.7, poses::waving),
            AnimationState::Eating => spec(Ticks(120), true, 0.6, poses::eating),
            AnimationState::Sleeping => spec(Looping, true, 3.0, poses::sleeping),
            AnimationState::WorkingAtDesk => spec(Looping, true, 0.4, poses::working_at_desk),
            AnimationState::LayingOnSide => spec(Ticks(150), true, 3.0, poses::laying_on_side),
            AnimationState::LayingOnFace => spec(Ticks(150), true, 3.0, poses::laying_on_face),
            AnimationState::FallingOnFace => spec(Settle, false, 1.0, poses::falling_on_face),
            AnimationState::TippingOverSide => spec(Settle, false, 1.0, poses::tipping_over_side),
            AnimationState::BeingDraggedOnGround => spec(Looping, false, 0.4, poses::being_dragged_on_ground),
            AnimationState::Dangling => spec(Looping, false, 1.2, poses::dangling),
            AnimationState::Airborne => spec(Looping, false, 0.3, poses::airborne),
            AnimationState::TakingDamage => spec(Ticks(30), false, 0.5, poses::taking_damage),
            AnimationState::HappyBounce => spec(Ticks(120), true, 0.5, poses::happy_bounce),
            AnimationState::SleepySlow => spec(Ticks(240), true, 3.5, poses::sleepy_slow),
            AnimationState::MischievousGrin => spec(Ticks(180), true, 1.2, poses::mischievous_grin),
            AnimationState::AnnoyedGrumpy => spec(Ticks(180), true, 0.8, poses::annoyed_grumpy),
        }
    }

    /// Fixed-length, non-interruptible falls.
    pub fn is_settling(self) -> bool {
        matches!(self, AnimationState::FallingOnFace | AnimationState::TippingOverSide)
    }

    /// States driven by pointer capture or flight, never by external triggers.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            AnimationState::BeingDraggedOnGround | AnimationState::Dangling | AnimationState::Airborne
        )
    }

    /// Where a finished state goes when nothing is queued.
    pub fn successor(self) -> AnimationState {
        match self {
            AnimationState::FallingOnFace => AnimationState::LayingOnFace,
            AnimationState::TippingOverSide => AnimationState::LayingOnSide,
            _ => AnimationState::Idle,
        }
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimationState {
    type Err = TriggerError;

    /// Accepts snake_case, CamelCase and a few short aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let alias = match key.as_str() {
            "working" | "work" => Some(AnimationState::WorkingAtDesk),
            "clicked" | "wave" => Some(AnimationState::Waving),
            "fed" | "eat" => Some(AnimationState::Eating),
            "sleep" => Some(AnimationState::Sleeping),
            "jump" => Some(AnimationState::Jumping),
            "walk" => Some(AnimationState::Walking),
            "celebrate" => Some(AnimationState::Celebrating),
            "wallhit" | "damage" => Some(AnimationState::TakingDamage),
            "fallonface" => Some(AnimationState::FallingOnFace),
            "tipover" => Some(AnimationState::TippingOverSide),
            "layonside" => Some(AnimationState::LayingOnSide),
            _ => None,
        };
        alias
            .or_else(|| {
                AnimationState::ALL
                    .into_iter()
                    .find(|state| state.name().replace('_', "") == key)
            })
            .ok_or_else(|| TriggerError::UnknownState(s.to_string()))
    }
}

/// Why a trigger was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error("unknown animation state '{0}'")]
    UnknownState(String),
    #[error("state {current} cannot be interrupted")]
    NotInterruptible { current: AnimationState },
    #[error("state {0} is driven internally and cannot be triggered")]
    InternalState(AnimationState),
    #[error("companion entity is missing")]
    MissingCompanion,
}

/// An applied state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: AnimationState,
    pub to: AnimationState,
}

/// A state waiting to play after the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedState {
    pub state: AnimationState,
    pub duration_ticks: Option<u32>,
}

/// Runtime state machine of the companion.
///
/// # Fields
/// - `current` / `previous` - Active and last state
/// - `ticks_in_state` / `time_in_state` - Progress in ticks and seconds
/// - `duration_ticks` - Resolved length; `None` loops until replaced
/// - `settle_progress` - 0 → 1 during falls, 1 while laying, 0 otherwise
/// - `phase` - Pose cycle phase in [0, 1)
/// - `queue` - Follow-up states, front first
#[derive(Component, Debug, Clone)]
pub struct AnimationPlayer {
    pub current: AnimationState,
    pub previous: Option<AnimationState>,
    pub ticks_in_state: u32,
    pub time_in_state: f32,
    pub duration_ticks: Option<u32>,
    pub settle_progress: f32,
    pub phase: f32,
    pub queue: SmallVec<[QueuedState; 4]>,
    settle_ticks: u32,
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new(24)
    }
}

impl AnimationPlayer {
    /// Start in Idle. `settle_ticks` is the length of falling states.
    pub fn new(settle_ticks: u32) -> Self {
        Self {
            current: AnimationState::Idle,
            previous: None,
            ticks_in_state: 0,
            time_in_state: 0.0,
            duration_ticks: None,
            settle_progress: 0.0,
            phase: 0.0,
            queue: SmallVec::new(),
            settle_ticks: settle_ticks.max(1),
        }
    }

    pub fn spec(&self) -> StateSpec {
        self.current.spec()
    }

    pub fn is_finished(&self) -> bool {
        self.duration_ticks
            .is_some_and(|duration| self.ticks_in_state >= duration)
    }

    /// External triggers are accepted while interruptible or once finished.
    pub fn accepts_triggers(&self) -> bool {
        self.spec().interruptible || self.is_finished()
    }

    /// Apply an external trigger. Clears the queue on success.
    pub fn request(&mut self, state: AnimationState, duration_ticks: Option<u32>) -> Result<Transition, TriggerError> {
        if state.is_internal() {
            return Err(TriggerError::InternalState(state));
        }
        if !self.accepts_triggers() {
            return Err(TriggerError::NotInterruptible { current: self.current });
        }
        self.queue.clear();
        Ok(self.enter(state, duration_ticks))
    }

    /// Switch state unconditionally. Used by internal transitions.
    pub fn enter(&mut self, state: AnimationState, duration_ticks: Option<u32>) -> Transition {
        let from = self.current;
        self.previous = Some(from);
        self.current = state;
        self.ticks_in_state = 0;
        self.time_in_state = 0.0;
        self.phase = 0.0;
        self.duration_ticks = self.resolve_duration(state, duration_ticks);
        self.settle_progress = match state {
            AnimationState::LayingOnSide | AnimationState::LayingOnFace => 1.0,
            _ => 0.0,
        };
        Transition { from, to: state }
    }

    pub fn enqueue(&mut self, state: AnimationState, duration_ticks: Option<u32>) {
        self.queue.push(QueuedState { state, duration_ticks });
    }

    fn resolve_duration(&self, state: AnimationState, duration_ticks: Option<u32>) -> Option<u32> {
        match state.spec().duration {
            StateDuration::Settle => Some(self.settle_ticks),
            StateDuration::Ticks(nominal) => Some(duration_ticks.unwrap_or(nominal).max(1)),
            StateDuration::Looping => duration_ticks.map(|ticks| ticks.max(1)),
        }
    }

    /// Advance one tick of `dt` seconds with the mood's animation speed.
    ///
    /// Returns the transition taken when the current state finished.
    pub fn advance(&mut self, dt: f32, speed: f32) -> Option<Transition> {
        self.ticks_in_state = self.ticks_in_state.saturating_add(1);
        self.time_in_state += dt;
        let cycle = self.spec().cycle_secs.max(f32::EPSILON);
        self.phase = (self.phase + dt * speed / cycle).rem_euclid(1.0);

        if self.current.is_settling() {
            let progress = self.ticks_in_state as f32 / self.settle_ticks as f32;
            self.settle_progress = self.settle_progress.max(progress.min(1.0));
        }

        if !self.is_finished() {
            return None;
        }
        let next = if self.queue.is_empty() {
            QueuedState {
                state: self.current.successor(),
                duration_ticks: None,
            }
        } else {
            self.queue.remove(0)
        };
        Some(self.enter(next.state, next.duration_ticks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_looping() {
        let player = AnimationPlayer::default();
        assert_eq!(player.current, AnimationState::Idle);
        assert!(player.duration_ticks.is_none());
        assert!(player.accepts_triggers());
    }

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("working_at_desk".parse(), Ok(AnimationState::WorkingAtDesk));
        assert_eq!("WorkingAtDesk".parse(), Ok(AnimationState::WorkingAtDesk));
        assert_eq!("working".parse(), Ok(AnimationState::WorkingAtDesk));
        assert_eq!("Tipping-Over-Side".parse(), Ok(AnimationState::TippingOverSide));
        assert_eq!(
            "moonwalk".parse::<AnimationState>(),
            Err(TriggerError::UnknownState("moonwalk".to_string()))
        );
        for state in AnimationState::ALL {
            assert_eq!(state.name().parse(), Ok(state));
        }
    }

    #[test]
    fn settling_state_rejects_until_complete() {
        let mut player = AnimationPlayer::new(24);
        player.request(AnimationState::FallingOnFace, None).unwrap();
        let mut last = 0.0;
        for tick in 1..24 {
            assert!(player.advance(1.0 / 60.0, 1.0).is_none(), "finished early at {tick}");
            assert!(player.settle_progress >= last);
            last = player.settle_progress;
            assert!(matches!(
                player.request(AnimationState::Waving, None),
                Err(TriggerError::NotInterruptible { .. })
            ));
        }
        let transition = player.advance(1.0 / 60.0, 1.0).unwrap();
        assert_eq!(transition.to, AnimationState::LayingOnFace);
        assert_eq!(player.settle_progress, 1.0);
        assert!(player.request(AnimationState::Waving, None).is_ok());
    }

    #[test]
    fn settle_length_ignores_override() {
        let mut player = AnimationPlayer::new(24);
        player.request(AnimationState::TippingOverSide, Some(5)).unwrap();
        assert_eq!(player.duration_ticks, Some(24));
    }

    #[test]
    fn finite_state_falls_back_to_idle() {
        let mut player = AnimationPlayer::default();
        player.request(AnimationState::Waving, Some(3)).unwrap();
        assert!(player.advance(0.016, 1.0).is_none());
        assert!(player.advance(0.016, 1.0).is_none());
        let t = player.advance(0.016, 1.0).unwrap();
        assert_eq!(t, Transition { from: AnimationState::Waving, to: AnimationState::Idle });
    }

    #[test]
    fn queue_plays_back_to_back_and_clears_on_trigger() {
        let mut player = AnimationPlayer::default();
        player.request(AnimationState::Eating, Some(1)).unwrap();
        player.enqueue(AnimationState::Celebrating, Some(1));
        assert_eq!(player.advance(0.016, 1.0).map(|t| t.to), Some(AnimationState::Celebrating));
        assert_eq!(player.advance(0.016, 1.0).map(|t| t.to), Some(AnimationState::Idle));

        player.request(AnimationState::Eating, Some(10)).unwrap();
        player.enqueue(AnimationState::Celebrating, None);
        player.request(AnimationState::Waving, None).unwrap();
        assert!(player.queue.is_empty());
    }

    #[test]
    fn internal_states_cannot_be_triggered() {
        let mut player = AnimationPlayer::default();
        assert_eq!(
            player.request(AnimationState::Airborne, None),
            Err(TriggerError::InternalState(AnimationState::Airborne))
        );
        assert_eq!(player.current, AnimationState::Idle);
    }

    #[test]
    fn looping_with_override_becomes_finite() {
        let mut player = AnimationPlayer::default();
        player.request(AnimationState::Sleeping, Some(2)).unwrap();
        assert_eq!(player.duration_ticks, Some(2));
        player.advance(0.016, 1.0);
        assert!(player.advance(0.016, 1.0).is_some());
    }

    #[test]
    fn phase_wraps() {
        let mut player = AnimationPlayer::default();
        for _ in 0..500 {
            player.advance(1.0 / 60.0, 1.0);
            assert!((0.0..1.0).contains(&player.phase));
        }
    }
}
