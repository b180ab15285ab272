//! Type-keyed handler and subscriber tables.
//!
//! Both tables are assembled by consuming builders during bootstrap and are
//! read-only afterwards, so lookups need no locking.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use super::error::{DispatchError, RegistryError};
use super::handler::{CommandHandler, EventSubscriber, QueryHandler};
use super::message::{Command, Event, MessageKind, MessageType, Query};

type Erased = Box<dyn Any + Send + Sync>;

struct Slot {
    message: MessageType,
    // Holds `Arc<dyn CommandHandler<C>>`, `Arc<dyn QueryHandler<Q>>` or
    // `Vec<Arc<dyn EventSubscriber<E>>>` for the keyed message type.
    entry: Erased,
}

/// Ordered subscriber lists keyed by event type.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: HashMap<MessageType, Slot>,
}

impl SubscriberRegistry {
    /// Start an empty builder.
    #[must_use]
    pub fn builder() -> SubscriberRegistryBuilder {
        SubscriberRegistryBuilder::default()
    }

    /// Subscribers for `E` in registration order; empty when none exist.
    #[must_use]
    pub fn resolve<E: Event>(&self) -> &[Arc<dyn EventSubscriber<E>>] {
        self.subscribers
            .get(&MessageType::of::<E>())
            .and_then(|slot| slot.entry.downcast_ref::<Vec<Arc<dyn EventSubscriber<E>>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of event types with at least one subscriber.
    #[must_use]
    pub fn event_types(&self) -> usize {
        self.subscribers.len()
    }
}

/// Builder for [`SubscriberRegistry`].
#[derive(Default)]
pub struct SubscriberRegistryBuilder {
    subscribers: HashMap<MessageType, Slot>,
}

impl SubscriberRegistryBuilder {
    /// Append `subscriber` to the list for `E`.
    ///
    /// Subscribing the same implementation twice delivers each event to it
    /// twice.
    #[must_use]
    pub fn subscribe<E, S>(mut self, subscriber: S) -> Self
    where
        E: Event,
        S: EventSubscriber<E> + 'static,
    {
        self.push::<E>(Arc::new(subscriber));
        self
    }

    /// Append an already shared subscriber to the list for `E`.
    #[must_use]
    pub fn subscribe_shared<E: Event>(mut self, subscriber: Arc<dyn EventSubscriber<E>>) -> Self {
        self.push::<E>(subscriber);
        self
    }

    fn push<E: Event>(&mut self, subscriber: Arc<dyn EventSubscriber<E>>) {
        let message = MessageType::of::<E>();
        let slot = self.subscribers.entry(message).or_insert_with(|| Slot {
            message,
            entry: Box::new(Vec::<Arc<dyn EventSubscriber<E>>>::new()),
        });
        // The slot is keyed by `E`, so the downcast always matches.
        if let Some(list) = slot.entry.downcast_mut::<Vec<Arc<dyn EventSubscriber<E>>>>() {
            list.push(subscriber);
        }
    }

    /// Freeze the subscriber lists.
    #[must_use]
    pub fn build(self) -> SubscriberRegistry {
        SubscriberRegistry {
            subscribers: self.subscribers,
        }
    }
}

/// Command and query handlers plus the shared subscriber table.
pub struct MessageRegistry {
    commands: HashMap<MessageType, Slot>,
    queries: HashMap<MessageType, Slot>,
    events: Arc<SubscriberRegistry>,
}

impl MessageRegistry {
    /// Start a builder that shares `events` with any publisher built from it.
    #[must_use]
    pub fn builder(events: Arc<SubscriberRegistry>) -> MessageRegistryBuilder {
        MessageRegistryBuilder {
            commands: HashMap::new(),
            queries: HashMap::new(),
            events,
        }
    }

    /// Handler registered for command `C`.
    pub fn resolve_command<C: Command>(&self) -> Result<Arc<dyn CommandHandler<C>>, DispatchError> {
        let message = MessageType::of::<C>();
        self.commands
            .get(&message)
            .and_then(|slot| slot.entry.downcast_ref::<Arc<dyn CommandHandler<C>>>())
            .cloned()
            .ok_or(DispatchError::NoHandler {
                kind: MessageKind::Command,
                message,
            })
    }

    /// Handler registered for query `Q`.
    pub fn resolve_query<Q: Query>(&self) -> Result<Arc<dyn QueryHandler<Q>>, DispatchError> {
        let message = MessageType::of::<Q>();
        self.queries
            .get(&message)
            .and_then(|slot| slot.entry.downcast_ref::<Arc<dyn QueryHandler<Q>>>())
            .cloned()
            .ok_or(DispatchError::NoHandler {
                kind: MessageKind::Query,
                message,
            })
    }

    /// Subscriber table shared with the publisher.
    #[must_use]
    pub fn events(&self) -> Arc<SubscriberRegistry> {
        Arc::clone(&self.events)
    }

    /// Counts used for the bootstrap log line.
    #[must_use]
    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary {
            commands: self.commands.len(),
            queries: self.queries.len(),
            event_types: self.events.event_types(),
        }
    }

    /// Every registered command and query type.
    pub fn handled(&self) -> impl Iterator<Item = (MessageKind, MessageType)> + '_ {
        let commands = self
            .commands
            .values()
            .map(|slot| (MessageKind::Command, slot.message));
        let queries = self
            .queries
            .values()
            .map(|slot| (MessageKind::Query, slot.message));
        commands.chain(queries)
    }
}

/// Registration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySummary {
    /// Commands with a handler.
    pub commands: usize,
    /// Queries with a handler.
    pub queries: usize,
    /// Event types with at least one subscriber.
    pub event_types: usize,
}

/// Builder for [`MessageRegistry`].
pub struct MessageRegistryBuilder {
    commands: HashMap<MessageType, Slot>,
    queries: HashMap<MessageType, Slot>,
    events: Arc<SubscriberRegistry>,
}

impl MessageRegistryBuilder {
    /// Register the single handler for command `C`.
    pub fn command<C, H>(self, handler: H) -> Result<Self, RegistryError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.command_shared::<C>(Arc::new(handler))
    }

    /// Register an already shared handler for command `C`.
    pub fn command_shared<C: Command>(
        mut self,
        handler: Arc<dyn CommandHandler<C>>,
    ) -> Result<Self, RegistryError> {
        insert_unique(
            &mut self.commands,
            MessageKind::Command,
            MessageType::of::<C>(),
            Box::new(handler),
        )?;
        Ok(self)
    }

    /// Register the single handler for query `Q`.
    pub fn query<Q, H>(self, handler: H) -> Result<Self, RegistryError>
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        self.query_shared::<Q>(Arc::new(handler))
    }

    /// Register an already shared handler for query `Q`.
    pub fn query_shared<Q: Query>(
        mut self,
        handler: Arc<dyn QueryHandler<Q>>,
    ) -> Result<Self, RegistryError> {
        insert_unique(
            &mut self.queries,
            MessageKind::Query,
            MessageType::of::<Q>(),
            Box::new(handler),
        )?;
        Ok(self)
    }

    /// Freeze the handler tables.
    #[must_use]
    pub fn build(self) -> MessageRegistry {
        MessageRegistry {
            commands: self.commands,
            queries: self.queries,
            events: self.events,
        }
    }
}

fn insert_unique(
    table: &mut HashMap<MessageType, Slot>,
    kind: MessageKind,
    message: MessageType,
    entry: Erased,
) -> Result<(), RegistryError> {
    match table.entry(message) {
        Entry::Occupied(_) => Err(RegistryError::DuplicateHandler { kind, message }),
        Entry::Vacant(vacant) => {
            vacant.insert(Slot { message, entry });
            Ok(())
        }
    }
}
