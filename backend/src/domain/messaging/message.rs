//! Message kinds routed by the dispatcher.
//!
//! A message's identity is its Rust type: the registry keys handlers by
//! [`MessageType`], which wraps the type's `TypeId` and keeps the type name
//! for diagnostics.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An instruction to change state. Exactly one handler serves each type.
///
/// # Examples
/// ```
/// use switchboard::domain::messaging::Command;
///
/// struct ArchiveBooking {
///     booking_id: String,
/// }
///
/// impl Command for ArchiveBooking {
///     type Output = ();
/// }
/// ```
pub trait Command: Send + 'static {
    /// Value returned by the handler on success.
    type Output: Send + 'static;
}

/// A read request. Exactly one handler serves each type; handlers must not
/// mutate state.
pub trait Query: Send + 'static {
    /// Value returned by the handler on success.
    type Output: Send + 'static;
}

/// A notification that something already happened. Zero or more subscribers
/// may observe each type.
pub trait Event: Send + Sync + 'static {}

/// Message kinds routed to exactly one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// See [`Command`].
    Command,
    /// See [`Query`].
    Query,
}

impl MessageKind {
    /// Lower-case label used in errors and log records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type tag identifying a message type.
///
/// Equality and hashing use the `TypeId` only.
#[derive(Debug, Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    name: &'static str,
}

impl MessageType {
    /// Tag for the message type `M`.
    ///
    /// # Examples
    /// ```
    /// use switchboard::domain::messaging::MessageType;
    ///
    /// struct Ping;
    /// assert_eq!(MessageType::of::<Ping>(), MessageType::of::<Ping>());
    /// assert_ne!(MessageType::of::<Ping>(), MessageType::of::<u8>());
    /// ```
    #[must_use]
    pub fn of<M: 'static>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    /// Underlying type identifier used as the registry key.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
