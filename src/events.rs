//! Change notifier: a per-board publish/subscribe hub.
//!
//! Every subscriber gets its own channel. Publishing never blocks and a subscriber whose
//! receiver has been dropped is pruned on the next publish.

use crate::board::Coord;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// These coordinates changed value.
    Changed(Vec<Coord>),
    /// These coordinates formed a match and have been cleared.
    MatchesFound(Vec<Coord>),
    /// A player swap between these coordinates completed (after its matches resolved).
    TilesSwapped(Vec<Coord>),
    /// A spawn targeted an occupied top-row cell. Terminal for the session.
    Overflow,
}

impl BoardEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Changed(_) => EventKind::Changed,
            Self::MatchesFound(_) => EventKind::MatchesFound,
            Self::TilesSwapped(_) => EventKind::TilesSwapped,
            Self::Overflow => EventKind::Overflow,
        }
    }

    /// Coordinates carried by the event; empty for `Overflow`.
    pub fn coords(&self) -> &[Coord] {
        match self {
            Self::Changed(c) | Self::MatchesFound(c) | Self::TilesSwapped(c) => c,
            Self::Overflow => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Changed,
    MatchesFound,
    TilesSwapped,
    Overflow,
}

impl EventKind {
    pub const ALL: [Self; 4] = [
        Self::Changed,
        Self::MatchesFound,
        Self::TilesSwapped,
        Self::Overflow,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Receiving end of one subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<BoardEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next queued event, if any. Never blocks.
    pub fn try_next(&self) -> Option<BoardEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// All queued events in publish order.
    pub fn drain(&self) -> Vec<BoardEvent> {
        self.receiver.try_iter().collect()
    }
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    kinds: Vec<EventKind>,
    sender: Sender<BoardEvent>,
}

#[derive(Debug, Default)]
pub struct EventHub {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event kind.
    pub fn subscribe(&mut self) -> Subscription {
        self.subscribe_to(&EventKind::ALL)
    }

    pub fn subscribe_to(&mut self, kinds: &[EventKind]) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(Subscriber {
            id,
            kinds: kinds.to_vec(),
            sender,
        });
        Subscription { id, receiver }
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: &BoardEvent) {
        let kind = event.kind();
        self.subscribers
            .retain(|s| !s.kinds.contains(&kind) || s.sender.send(event.clone()).is_ok());
    }
}
