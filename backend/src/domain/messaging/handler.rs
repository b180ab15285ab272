//! Handler contracts for commands, queries and event subscribers.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use super::message::{Command, Event, Query};
use crate::domain::Error;

/// Handles one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Execute the command and return its result.
    async fn handle(&self, command: C) -> Result<C::Output, Error>;
}

/// Handles one query type.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    /// Answer the query.
    async fn handle(&self, query: Q) -> Result<Q::Output, Error>;
}

/// Observes one event type.
///
/// Subscribers are awaited in registration order. A returned error is logged
/// by the publisher and never reaches the code that published the event.
#[async_trait]
pub trait EventSubscriber<E: Event>: Send + Sync {
    /// Label used in log records and [`super::SubscriberError`].
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// React to the event.
    async fn handle(&self, event: &E) -> Result<(), Error>;
}

/// Adapter turning an async closure into a command or query handler.
///
/// # Examples
/// ```
/// use switchboard::domain::messaging::{handler_fn, Command, CommandHandler};
/// use switchboard::domain::Error;
///
/// struct Double(u32);
/// impl Command for Double {
///     type Output = u32;
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let handler = handler_fn(|Double(n): Double| async move { Ok::<_, Error>(n * 2) });
/// assert_eq!(CommandHandler::handle(&handler, Double(21)).await, Ok(42));
/// # });
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HandlerFn<F>(F);

/// Wrap `f` so it can be registered as a command or query handler.
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

#[async_trait]
impl<C, F, Fut> CommandHandler<C> for HandlerFn<F>
where
    C: Command,
    F: Fn(C) -> Fut + Send + Sync,
    Fut: Future<Output = Result<C::Output, Error>> + Send + 'static,
{
    async fn handle(&self, command: C) -> Result<C::Output, Error> {
        (self.0)(command).await
    }
}

#[async_trait]
impl<Q, F, Fut> QueryHandler<Q> for HandlerFn<F>
where
    Q: Query,
    F: Fn(Q) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Q::Output, Error>> + Send + 'static,
{
    async fn handle(&self, query: Q) -> Result<Q::Output, Error> {
        (self.0)(query).await
    }
}

/// Adapter turning an async closure into a named event subscriber.
pub struct SubscriberFn<E, F> {
    name: &'static str,
    f: F,
    _event: PhantomData<fn(&E)>,
}

/// Wrap `f` so it can be subscribed to events of type `E`.
///
/// The closure receives a borrowed event and must return a future that owns
/// whatever it needs; clone fields out of the event before the `async move`.
pub fn subscriber_fn<E, F, Fut>(name: &'static str, f: F) -> SubscriberFn<E, F>
where
    E: Event,
    F: Fn(&E) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    SubscriberFn {
        name,
        f,
        _event: PhantomData,
    }
}

#[async_trait]
impl<E, F, Fut> EventSubscriber<E> for SubscriberFn<E, F>
where
    E: Event,
    F: Fn(&E) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, event: &E) -> Result<(), Error> {
        (self.f)(event).await
    }
}
