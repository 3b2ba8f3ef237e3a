//! Outbound notifications.
//!
//! Systems write [`CompanionNotification`]s into `Messages`; the facade drains
//! them after every tick or immediate call so the host can react (sounds,
//! speech bubbles, persistence of stats).

use bevy_ecs::message::Message;
use serde::Serialize;

use crate::components::animation::AnimationState;
use crate::components::bodypart::BodyPart;
use crate::components::mood::{Mood, MoodChange, MoodChangeReason};
use crate::components::palette::ColorSlot;
use crate::components::sceneitem::ItemKind;

/// Kind of reaction a click produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClickReaction {
    Pet,
    Poke,
}

#[derive(Message, Debug, Clone, PartialEq, Serialize)]
pub enum CompanionNotification {
    StateChanged {
        from: AnimationState,
        to: AnimationState,
    },
    MoodChanged {
        from: Mood,
        to: Mood,
        reason: MoodChangeReason,
    },
    Clicked {
        part: BodyPart,
        reaction: ClickReaction,
    },
    DragStarted {
        part: BodyPart,
    },
    Thrown {
        velocity: [f32; 2],
    },
    Bounced {
        bounce: u32,
        impact_speed: f32,
    },
    Landed {
        bounces: u32,
    },
    WallHit {
        speed: f32,
    },
    ItemAdded {
        id: u32,
        kind: ItemKind,
    },
    ItemReached {
        id: u32,
    },
    ItemRemoved {
        id: u32,
    },
    ColorChanged {
        slot: ColorSlot,
        rgb: [u8; 3],
    },
}

impl From<MoodChange> for CompanionNotification {
    fn from(change: MoodChange) -> Self {
        CompanionNotification::MoodChanged {
            from: change.from,
            to: change.to,
            reason: change.reason,
        }
    }
}
