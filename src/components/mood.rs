//! Companion mood.
//!
//! Moods drift over time according to a transition matrix, react to
//! interactions and focus changes, and scale animation and movement speed.
//! All timing uses simulated seconds from
//! [`WorldTime`](crate::resources::worldtime::WorldTime); randomness comes from
//! the seedable [`CompanionRng`](crate::resources::rng::CompanionRng).

use bevy_ecs::prelude::Component;
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use super::animation::AnimationState;

/// Interactions counted for the over-interaction rule, seconds.
pub const INTERACTION_WINDOW_SECS: f32 = 60.0;
/// More interactions than this inside the window makes the companion annoyed.
pub const MAX_INTERACTIONS_PER_WINDOW: usize = 10;
/// Above this many recent interactions an annoyed companion gets angrier.
const ANNOYANCE_BUILDUP_INTERACTIONS: usize = 5;
/// Ceiling of the time-decay change probability.
const MAX_CHANGE_PROBABILITY: f32 = 0.8;
const WAKE_ON_INTERACTION_CHANCE: f32 = 0.3;
const SLEEPY_ON_FOCUS_LOST_CHANCE: f32 = 0.4;
const HAPPY_ON_FOCUS_GAINED_CHANCE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Sleepy,
    Mischievous,
    Annoyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoodChangeReason {
    TimeDecay,
    UserInteraction,
    EnvironmentalEvent,
    QuestCompletion,
    IdleTooLong,
    TooManyInteractions,
    Forced,
}

/// Host focus changes that influence mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Lost,
    Gained,
}

/// Behaviour scaling for the current mood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoodModifiers {
    pub interaction_frequency: f32,
    pub animation_speed: f32,
    pub movement_speed: f32,
    pub rest_probability: f32,
}

/// A mood switch, reported as a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoodChange {
    pub from: Mood,
    pub to: Mood,
    pub reason: MoodChangeReason,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Happy, Mood::Sleepy, Mood::Mischievous, Mood::Annoyed];

    pub fn name(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sleepy => "sleepy",
            Mood::Mischievous => "mischievous",
            Mood::Annoyed => "annoyed",
        }
    }

    /// Animation that expresses this mood.
    pub fn variant(self) -> AnimationState {
        match self {
            Mood::Happy => AnimationState::HappyBounce,
            Mood::Sleepy => AnimationState::SleepySlow,
            Mood::Mischievous => AnimationState::MischievousGrin,
            Mood::Annoyed => AnimationState::AnnoyedGrumpy,
        }
    }

    /// `(min, max)` seconds a mood lasts before time decay may replace it.
    pub fn duration_range(self) -> (f32, f32) {
        match self {
            Mood::Happy => (120.0, 300.0),
            Mood::Sleepy => (60.0, 180.0),
            Mood::Mischievous => (90.0, 240.0),
            Mood::Annoyed => (30.0, 120.0),
        }
    }

    /// Next-mood weights in [`Mood::ALL`] order.
    pub fn transition_weights(self) -> [f32; 4] {
        match self {
            Mood::Happy => [0.2, 0.3, 0.4, 0.1],
            Mood::Sleepy => [0.4, 0.3, 0.2, 0.1],
            Mood::Mischievous => [0.3, 0.2, 0.3, 0.2],
            Mood::Annoyed => [0.3, 0.3, 0.2, 0.2],
        }
    }

    pub fn modifiers(self, intensity: f32) -> MoodModifiers {
        match self {
            Mood::Happy => MoodModifiers {
                interaction_frequency: 1.3 * intensity,
                animation_speed: 1.2,
                movement_speed: 1.3,
                rest_probability: 0.05,
            },
            Mood::Sleepy => MoodModifiers {
                interaction_frequency: 0.3 * intensity,
                animation_speed: 0.6,
                movement_speed: 0.5,
                rest_probability: 0.7,
            },
            Mood::Mischievous => MoodModifiers {
                interaction_frequency: 1.5 * intensity,
                animation_speed: 1.1,
                movement_speed: 1.2,
                rest_probability: 0.03,
            },
            Mood::Annoyed => MoodModifiers {
                interaction_frequency: 0.7,
                animation_speed: 0.9,
                movement_speed: 0.8,
                rest_probability: 0.3,
            },
        }
    }

    /// Weighted pick of the next mood.
    pub fn pick_next(self, rng: &mut Rng) -> Mood {
        let weights = self.transition_weights();
        let total: f32 = weights.iter().sum();
        let mut roll = rng.f32() * total;
        for (mood, weight) in Mood::ALL.into_iter().zip(weights) {
            if roll < weight {
                return mood;
            }
            roll -= weight;
        }
        self
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|mood| mood.name() == key)
            .ok_or_else(|| format!("unknown mood '{}'", s))
    }
}

/// Mood state of the companion.
#[derive(Component, Debug, Clone)]
pub struct MoodState {
    pub mood: Mood,
    /// How strongly the mood is expressed, [0, 1].
    pub intensity: f32,
    /// Simulated time the current mood started.
    pub since: f32,
    pub last_interaction: f32,
    /// Timestamps of interactions inside the rolling window.
    pub recent_interactions: SmallVec<[f32; 16]>,
}

impl Default for MoodState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl MoodState {
    pub fn new(now: f32) -> Self {
        Self {
            mood: Mood::Happy,
            intensity: 0.7,
            since: now,
            last_interaction: now,
            recent_interactions: SmallVec::new(),
        }
    }

    pub fn modifiers(&self) -> MoodModifiers {
        self.mood.modifiers(self.intensity)
    }

    pub fn time_in_mood(&self, now: f32) -> f32 {
        now - self.since
    }

    pub fn interactions_in_window(&self) -> usize {
        self.recent_interactions.len()
    }

    /// Switch mood unconditionally. Returns `None` when already in `mood`.
    pub fn set(&mut self, mood: Mood, reason: MoodChangeReason, now: f32, rng: &mut Rng) -> Option<MoodChange> {
        if mood == self.mood {
            return None;
        }
        let change = MoodChange {
            from: self.mood,
            to: mood,
            reason,
        };
        self.mood = mood;
        self.since = now;
        self.intensity = 0.7 + rng.f32() * 0.3;
        Some(change)
    }

    /// Record a user interaction and apply its mood reactions.
    pub fn register_interaction(&mut self, now: f32, rng: &mut Rng) -> Option<MoodChange> {
        self.prune(now);
        self.last_interaction = now;
        self.recent_interactions.push(now);

        if self.interactions_in_window() > MAX_INTERACTIONS_PER_WINDOW {
            return self.set(Mood::Annoyed, MoodChangeReason::TooManyInteractions, now, rng);
        }
        match self.mood {
            Mood::Sleepy if rng.f32() < WAKE_ON_INTERACTION_CHANCE => {
                self.set(Mood::Happy, MoodChangeReason::UserInteraction, now, rng)
            }
            Mood::Annoyed if self.interactions_in_window() > ANNOYANCE_BUILDUP_INTERACTIONS => {
                self.intensity = (self.intensity + 0.1).min(1.0);
                None
            }
            _ => None,
        }
    }

    pub fn focus_changed(&mut self, focus: FocusChange, now: f32, rng: &mut Rng) -> Option<MoodChange> {
        match focus {
            FocusChange::Lost if rng.f32() < SLEEPY_ON_FOCUS_LOST_CHANCE => {
                self.set(Mood::Sleepy, MoodChangeReason::EnvironmentalEvent, now, rng)
            }
            FocusChange::Gained if self.mood == Mood::Sleepy && rng.f32() < HAPPY_ON_FOCUS_GAINED_CHANCE => {
                self.set(Mood::Happy, MoodChangeReason::EnvironmentalEvent, now, rng)
            }
            _ => None,
        }
    }

    /// Achievements always cheer the companion up.
    pub fn quest_completed(&mut self, now: f32, rng: &mut Rng) -> Option<MoodChange> {
        let change = self.set(Mood::Happy, MoodChangeReason::QuestCompletion, now, rng);
        self.intensity = 0.9;
        change
    }

    /// Periodic check: time decay, long idling, over-interaction.
    pub fn periodic_check(&mut self, now: f32, idle_sleep_secs: f32, rng: &mut Rng) -> Option<MoodChange> {
        self.prune(now);

        if self.interactions_in_window() > MAX_INTERACTIONS_PER_WINDOW {
            return self.set(Mood::Annoyed, MoodChangeReason::TooManyInteractions, now, rng);
        }
        if now - self.last_interaction > idle_sleep_secs {
            if let Some(change) = self.set(Mood::Sleepy, MoodChangeReason::IdleTooLong, now, rng) {
                return Some(change);
            }
        }

        let (min, max) = self.mood.duration_range();
        let in_mood = self.time_in_mood(now);
        if in_mood <= min {
            return None;
        }
        let probability = ((in_mood - min) / (max - min)).min(MAX_CHANGE_PROBABILITY);
        if rng.f32() < probability {
            let next = self.mood.pick_next(rng);
            return self.set(next, MoodChangeReason::TimeDecay, now, rng);
        }
        None
    }

    fn prune(&mut self, now: f32) {
        self.recent_interactions
            .retain(|t| now - *t < INTERACTION_WINDOW_SECS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_weights_sum_to_one() {
        for mood in Mood::ALL {
            let sum: f32 = mood.transition_weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "{mood}: {sum}");
        }
    }

    #[test]
    fn too_many_interactions_annoy() {
        let mut rng = Rng::with_seed(7);
        let mut state = MoodState::new(0.0);
        let mut change = None;
        for i in 0..=MAX_INTERACTIONS_PER_WINDOW {
            change = state.register_interaction(i as f32, &mut rng).or(change);
        }
        assert_eq!(state.mood, Mood::Annoyed);
        assert_eq!(change.map(|c| c.reason), Some(MoodChangeReason::TooManyInteractions));
    }

    #[test]
    fn interactions_outside_window_expire() {
        let mut rng = Rng::with_seed(1);
        let mut state = MoodState::new(0.0);
        for i in 0..8 {
            state.register_interaction(i as f32, &mut rng);
        }
        state.register_interaction(200.0, &mut rng);
        assert_eq!(state.interactions_in_window(), 1);
    }

    #[test]
    fn long_idle_turns_sleepy() {
        let mut rng = Rng::with_seed(3);
        let mut state = MoodState::new(0.0);
        let change = state.periodic_check(130.0, 120.0, &mut rng);
        assert_eq!(change.map(|c| c.to), Some(Mood::Sleepy));
        assert_eq!(change.map(|c| c.reason), Some(MoodChangeReason::IdleTooLong));
    }

    #[test]
    fn no_decay_before_minimum_duration() {
        let mut rng = Rng::with_seed(11);
        let mut state = MoodState::new(0.0);
        for t in 1..10 {
            let now = t as f32 * 10.0;
            state.last_interaction = now;
            assert!(state.periodic_check(now, 120.0, &mut rng).is_none());
        }
    }

    #[test]
    fn quest_completion_sets_high_intensity_happy() {
        let mut rng = Rng::with_seed(5);
        let mut state = MoodState::new(0.0);
        state.set(Mood::Annoyed, MoodChangeReason::Forced, 0.0, &mut rng);
        state.quest_completed(1.0, &mut rng);
        assert_eq!(state.mood, Mood::Happy);
        assert_eq!(state.intensity, 0.9);
    }

    #[test]
    fn set_same_mood_is_noop() {
        let mut rng = Rng::with_seed(5);
        let mut state = MoodState::new(0.0);
        assert!(state.set(Mood::Happy, MoodChangeReason::Forced, 1.0, &mut rng).is_none());
        assert_eq!(state.since, 0.0);
    }

    #[test]
    fn sleepy_slows_everything() {
        let m = Mood::Sleepy.modifiers(1.0);
        assert!(m.animation_speed < 1.0);
        assert!(m.movement_speed < 1.0);
        assert_eq!(Mood::Sleepy.variant(), AnimationState::SleepySlow);
    }
}
