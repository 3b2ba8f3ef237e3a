//! Cross-thread event inbox.
//!
//! External collaborators may live on other threads. They hold an
//! [`EventSender`] and push [`CompanionEvent`]s into an unbounded channel; the
//! [`EventInbox`] resource owns the receiving end and
//! [`drain_event_inbox`](crate::systems::inbox::drain_event_inbox) empties it
//! once per tick, before the simulation advances.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};

use crate::events::companion::CompanionEvent;

/// Receiving side of the inbox, owned by the ECS world.
#[derive(Resource)]
pub struct EventInbox {
    pub rx: Receiver<CompanionEvent>,
    tx: Sender<CompanionEvent>,
}

impl Default for EventInbox {
    fn default() -> Self {
        let (tx, rx) = unbounded::<CompanionEvent>();
        Self { rx, tx }
    }
}

impl EventInbox {
    /// A new producer handle. Cheap to clone and `Send`.
    pub fn sender(&self) -> EventSender {
        EventSender { tx: self.tx.clone() }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Thread-safe producer of companion events.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: Sender<CompanionEvent>,
}

impl EventSender {
    /// Queue an event for the next tick. Returns `false` if the companion is gone.
    pub fn send(&self, event: CompanionEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Disconnected(_)) | Err(TrySendError::Full(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_cross_threads_in_order() {
        let inbox = EventInbox::default();
        let sender = inbox.sender();
        let handle = std::thread::spawn(move || {
            assert!(sender.send(CompanionEvent::Feed));
            assert!(sender.send(CompanionEvent::Pet));
        });
        handle.join().unwrap();
        assert_eq!(inbox.pending(), 2);
        let drained: Vec<_> = inbox.rx.try_iter().collect();
        assert_eq!(drained, vec![CompanionEvent::Feed, CompanionEvent::Pet]);
    }

    #[test]
    fn send_fails_after_inbox_dropped() {
        let inbox = EventInbox::default();
        let sender = inbox.sender();
        drop(inbox);
        assert!(!sender.send(CompanionEvent::Feed));
    }
}
