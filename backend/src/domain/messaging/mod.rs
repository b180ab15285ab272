//! In-process message dispatch.
//!
//! Three message kinds are routed by type:
//! - a [`Command`] or [`Query`] resolves to exactly one handler, and dispatch
//!   fails with [`DispatchError::NoHandler`] rather than doing nothing;
//! - an [`Event`] fans out to zero or more subscribers, awaited one at a time
//!   in registration order.
//!
//! Tables are assembled once at boot and never change afterwards. Event
//! subscribers live in their own [`SubscriberRegistry`] so command handlers
//! can be handed an [`EventPublisher`] before the [`MessageRegistry`] that
//! will own them exists.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use switchboard::domain::Error;
//! use switchboard::domain::messaging::{
//!     handler_fn, Command, Dispatcher, MessageRegistry, SubscriberRegistry,
//! };
//! use switchboard::test_support::memory_logger;
//!
//! struct Greet(String);
//! impl Command for Greet {
//!     type Output = String;
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let (logger, _sink) = memory_logger();
//! let events = Arc::new(SubscriberRegistry::builder().build());
//! let registry = MessageRegistry::builder(events)
//!     .command::<Greet, _>(handler_fn(|Greet(name): Greet| async move {
//!         Ok::<_, Error>(format!("hello {name}"))
//!     }))
//!     .expect("unique handler")
//!     .build();
//! let dispatcher = Dispatcher::new(registry, &logger);
//!
//! let greeting = dispatcher.execute(Greet("ada".into())).await.expect("handled");
//! assert_eq!(greeting, "hello ada");
//! # });
//! ```

mod dispatcher;
mod error;
mod handler;
mod message;
mod publisher;
mod registry;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, RegistryError, SubscriberError};
pub use handler::{
    CommandHandler, EventSubscriber, HandlerFn, QueryHandler, SubscriberFn, handler_fn,
    subscriber_fn,
};
pub use message::{Command, Event, MessageKind, MessageType, Query};
pub use publisher::{EventPublisher, PublishReport};
pub use registry::{
    MessageRegistry, MessageRegistryBuilder, RegistrySummary, SubscriberRegistry,
    SubscriberRegistryBuilder,
};
