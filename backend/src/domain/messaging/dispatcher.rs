//! Routes commands and queries to their single handler and events to their
//! subscribers.

use std::sync::Arc;

use serde_json::json;

use super::error::DispatchError;
use super::message::{Command, Event, Query};
use super::publisher::{EventPublisher, PublishReport};
use super::registry::MessageRegistry;
use crate::logging::Logger;

/// Entry point used by inbound adapters.
///
/// The dispatcher performs no queueing, throttling or retries: each call
/// resolves, invokes and awaits exactly one handler.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<MessageRegistry>,
    publisher: EventPublisher,
    logger: Logger,
}

impl Dispatcher {
    /// Dispatcher over a frozen registry.
    pub fn new(registry: MessageRegistry, logger: &Logger) -> Self {
        let publisher = EventPublisher::new(registry.events(), logger);
        Self {
            registry: Arc::new(registry),
            publisher,
            logger: logger.child("Dispatcher"),
        }
    }

    /// Run the handler for `command` and return its result unchanged.
    ///
    /// Fails with [`DispatchError::NoHandler`] before anything runs when no
    /// handler is registered.
    pub async fn execute<C: Command>(&self, command: C) -> Result<C::Output, DispatchError> {
        let handler = self.registry.resolve_command::<C>()?;
        self.logger.verbose(
            "executing command",
            Some(json!({ "command": std::any::type_name::<C>() })),
        );
        handler.handle(command).await.map_err(DispatchError::Handler)
    }

    /// Run the handler for `query` and return its result unchanged.
    pub async fn query<Q: Query>(&self, query: Q) -> Result<Q::Output, DispatchError> {
        let handler = self.registry.resolve_query::<Q>()?;
        self.logger.verbose(
            "executing query",
            Some(json!({ "query": std::any::type_name::<Q>() })),
        );
        handler.handle(query).await.map_err(DispatchError::Handler)
    }

    /// Deliver `event` to its subscribers. See [`EventPublisher::publish`].
    pub async fn publish<E: Event>(&self, event: &E) -> PublishReport {
        self.publisher.publish(event).await
    }

    /// Deliver `events` in order. See [`EventPublisher::publish_all`].
    pub async fn publish_all<E, I>(&self, events: I) -> PublishReport
    where
        E: Event,
        I: IntoIterator<Item = E>,
    {
        self.publisher.publish_all(events).await
    }

    /// Registry backing this dispatcher.
    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }
}
