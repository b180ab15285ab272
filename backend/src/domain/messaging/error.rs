//! Failures raised while registering, routing or delivering messages.

use super::message::{MessageKind, MessageType};
use crate::domain::Error;

/// Registration failed while wiring the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A command or query type already has a handler.
    #[error("duplicate {kind} handler registered for {message}")]
    DuplicateHandler {
        /// Kind of the duplicated registration.
        kind: MessageKind,
        /// Message type that was registered twice.
        message: MessageType,
    },
}

/// Routing or handling a command or query failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// Nothing is registered for the message type.
    #[error("no {kind} handler registered for {message}")]
    NoHandler {
        /// Kind of message that was dispatched.
        kind: MessageKind,
        /// Message type with no handler.
        message: MessageType,
    },
    /// The handler ran and returned an error.
    #[error(transparent)]
    Handler(Error),
}

impl From<DispatchError> for Error {
    fn from(value: DispatchError) -> Self {
        match value {
            // A missing handler is a wiring defect, not a client mistake.
            DispatchError::NoHandler { kind, message } => {
                Self::internal(format!("no {kind} handler registered for {message}"))
            }
            DispatchError::Handler(err) => err,
        }
    }
}

/// One subscriber failed while an event was being published.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("subscriber {subscriber} failed handling {event}: {source}")]
pub struct SubscriberError {
    event: MessageType,
    subscriber: &'static str,
    #[source]
    source: Error,
}

impl SubscriberError {
    pub(crate) fn new(event: MessageType, subscriber: &'static str, source: Error) -> Self {
        Self {
            event,
            subscriber,
            source,
        }
    }

    /// Event type being delivered.
    pub fn event(&self) -> MessageType {
        self.event
    }

    /// Name reported by the failing subscriber.
    pub fn subscriber(&self) -> &'static str {
        self.subscriber
    }

    /// Error the subscriber returned, or the panic it raised.
    pub fn error(&self) -> &Error {
        &self.source
    }
}
