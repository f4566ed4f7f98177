//! Change notifications
//!
//! Subscribers receive every event synchronously, in subscription order,
//! before the mutating registry call returns. Signal payloads borrow
//! registry-owned data and are only valid inside the callback.

use crate::signals::Signal;
use crate::types::MessageId;

/// A change made through the registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegistryEvent<'a> {
    /// The set of open files (or their source bindings) changed
    FileSetChanged,

    /// A signal was added; emitted once per source of the owning binding
    SignalAdded {
        id: MessageId,
        signal: &'a Signal,
    },

    /// A signal was updated (emitted once, not per source)
    SignalUpdated {
        /// Id the caller addressed
        id: MessageId,
        signal: &'a Signal,
    },

    /// A signal is about to be removed; it is still present while this
    /// event is delivered
    SignalRemoved {
        /// Id the caller addressed
        id: MessageId,
        signal: &'a Signal,
    },

    /// A message was created or its metadata changed
    MessageUpdated { id: MessageId },

    /// A message was removed
    MessageRemoved { id: MessageId },
}

impl RegistryEvent<'_> {
    /// Short name of the event kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEvent::FileSetChanged => "FileSetChanged",
            RegistryEvent::SignalAdded { .. } => "SignalAdded",
            RegistryEvent::SignalUpdated { .. } => "SignalUpdated",
            RegistryEvent::SignalRemoved { .. } => "SignalRemoved",
            RegistryEvent::MessageUpdated { .. } => "MessageUpdated",
            RegistryEvent::MessageRemoved { .. } => "MessageRemoved",
        }
    }

    /// Message id carried by the event, if any
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            RegistryEvent::FileSetChanged => None,
            RegistryEvent::SignalAdded { id, .. }
            | RegistryEvent::SignalUpdated { id, .. }
            | RegistryEvent::SignalRemoved { id, .. }
            | RegistryEvent::MessageUpdated { id }
            | RegistryEvent::MessageRemoved { id } => Some(*id),
        }
    }

    /// Signal carried by the event, if any
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            RegistryEvent::SignalAdded { signal, .. }
            | RegistryEvent::SignalUpdated { signal, .. }
            | RegistryEvent::SignalRemoved { signal, .. } => Some(*signal),
            _ => None,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&RegistryEvent<'_>) + Send>;

/// Ordered list of event handlers
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; it is called after all earlier subscribers
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&RegistryEvent<'_>) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler; returns false if it was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _)| *sid != id);
        self.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver an event to every handler
    pub fn emit(&mut self, event: &RegistryEvent<'_>) {
        log::trace!("Emitting {} to {} subscriber(s)", event.kind(), self.handlers.len());
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("next_id", &self.next_id)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
