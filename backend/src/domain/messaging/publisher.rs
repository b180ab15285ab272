//! Sequential event delivery.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::json;

use super::error::SubscriberError;
use super::message::{Event, MessageType};
use super::registry::SubscriberRegistry;
use crate::domain::Error;
use crate::logging::Logger;

/// Outcome of delivering one or more events.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PublishReport {
    delivered: usize,
    failures: Vec<SubscriberError>,
}

impl PublishReport {
    /// Subscriber invocations that returned `Ok`.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Subscriber failures in the order they happened.
    pub fn failures(&self) -> &[SubscriberError] {
        &self.failures
    }

    /// True when no subscriber failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold `other` into this report, keeping failure order.
    pub fn merge(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.failures.extend(other.failures);
    }
}

/// Delivers events to their subscribers one at a time.
///
/// Handlers hold a clone so they can publish what their aggregates recorded;
/// the subscriber table is shared with the [`super::MessageRegistry`].
#[derive(Clone)]
pub struct EventPublisher {
    subscribers: Arc<SubscriberRegistry>,
    logger: Logger,
}

impl EventPublisher {
    /// Publisher over `subscribers`.
    pub fn new(subscribers: Arc<SubscriberRegistry>, logger: &Logger) -> Self {
        Self {
            subscribers,
            logger: logger.child("EventPublisher"),
        }
    }

    /// Deliver `event` to every subscriber in registration order.
    ///
    /// Each subscriber is awaited before the next starts. A failing or
    /// panicking subscriber is logged and recorded in the report; the rest
    /// still run. Nothing is retried.
    pub async fn publish<E: Event>(&self, event: &E) -> PublishReport {
        let message = MessageType::of::<E>();
        let subscribers = self.subscribers.resolve::<E>();
        let mut report = PublishReport::default();
        if subscribers.is_empty() {
            self.logger.verbose(
                "event has no subscribers",
                Some(json!({ "event": message.name() })),
            );
            return report;
        }

        for subscriber in subscribers {
            let outcome = AssertUnwindSafe(subscriber.handle(event))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(panic_error(panic.as_ref())));
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    self.logger.error(
                        "event subscriber failed",
                        json!({
                            "event": message.name(),
                            "subscriber": subscriber.name(),
                            "code": err.code(),
                            "error": err.message(),
                        }),
                    );
                    report
                        .failures
                        .push(SubscriberError::new(message, subscriber.name(), err));
                }
            }
        }
        report
    }

    /// Publish `events` in iteration order.
    pub async fn publish_all<E, I>(&self, events: I) -> PublishReport
    where
        E: Event,
        I: IntoIterator<Item = E>,
    {
        let mut report = PublishReport::default();
        for event in events {
            report.merge(self.publish(&event).await);
        }
        report
    }
}

fn panic_error(panic: &(dyn Any + Send)) -> Error {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    Error::internal(format!("subscriber panicked: {detail}"))
}
