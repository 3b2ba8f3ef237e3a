//! Animation state change event and its logging observer.
//!
//! Every transition of the [`AnimationPlayer`](crate::components::animation::AnimationPlayer)
//! is triggered as a [`StateChangedEvent`] in addition to the outbound
//! notification, so observers can hook transitions without polling.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::animation::{AnimationState, Transition};

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChangedEvent {
    pub entity: Entity,
    pub from: AnimationState,
    pub to: AnimationState,
}

impl StateChangedEvent {
    pub fn new(entity: Entity, transition: Transition) -> Self {
        Self {
            entity,
            from: transition.from,
            to: transition.to,
        }
    }
}

/// Log every state change. Settling falls are interesting enough for `info`.
pub fn observe_state_change(trigger: On<StateChangedEvent>) {
    let event = trigger.event();
    if event.to.is_settling() {
        info!("companion {:?} is falling: {} -> {}", event.entity, event.from, event.to);
    } else {
        debug!("companion {:?} state: {} -> {}", event.entity, event.from, event.to);
    }
}
