//! Event subscription and dispatch.
//!
//! The page's event listeners are modelled as an explicit bus: handlers
//! subscribe to an [`EventKind`] on an [`EventTarget`] and get back a
//! [`SubscriptionId`] they can later pass to [`EventBus::unsubscribe`].
//! Dispatch is synchronous and single-threaded; matching handlers are
//! returned in subscription order.

use crate::dom::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Element(ElementId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyPress,
    Scroll,
}

/// A user-agent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: EventTarget,
    /// Key name for key presses (`"Enter"`, `"a"`, ...).
    pub key: Option<String>,
}

impl Event {
    #[must_use]
    pub fn click(target: ElementId) -> Self {
        Self {
            kind: EventKind::Click,
            target: EventTarget::Element(target),
            key: None,
        }
    }

    #[must_use]
    pub fn key_press(target: ElementId, key: impl Into<String>) -> Self {
        Self {
            kind: EventKind::KeyPress,
            target: EventTarget::Element(target),
            key: Some(key.into()),
        }
    }

    #[must_use]
    pub fn scroll() -> Self {
        Self {
            kind: EventKind::Scroll,
            target: EventTarget::Window,
            key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone)]
struct Subscription<H> {
    id: SubscriptionId,
    kind: EventKind,
    target: EventTarget,
    handler: H,
}

/// Registry of handlers keyed by event kind and target.
///
/// `H` is whatever the owner uses to name a handler; the bus only stores and
/// returns it.
#[derive(Debug, Clone)]
pub struct EventBus<H> {
    next_id: u64,
    subscriptions: Vec<Subscription<H>>,
}

impl<H> Default for EventBus<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> EventBus<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscriptions: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, kind: EventKind, target: EventTarget, handler: H) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            target,
            handler,
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        self.subscriptions.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl<H: Clone> EventBus<H> {
    /// Handlers subscribed to this event's kind and target.
    #[must_use]
    pub fn dispatch(&self, event: &Event) -> Vec<H> {
        self.subscriptions
            .iter()
            .filter(|sub| sub.kind == event.kind && sub.target == event.target)
            .map(|sub| sub.handler.clone())
            .collect()
    }
}
