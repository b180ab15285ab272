//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the dispatcher and the authentication port, and remain testable
//! without I/O.

use std::sync::Arc;

use crate::domain::messaging::Dispatcher;
use crate::domain::ports::Authenticator;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Routes commands and queries to their handlers.
    pub dispatcher: Dispatcher,
    /// Resolves bearer tokens for [`super::auth::AuthenticatedUser`].
    pub authenticator: Arc<dyn Authenticator>,
}

impl HttpState {
    /// Bundle the dispatcher with an authenticator.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use switchboard::domain::messaging::{Dispatcher, MessageRegistry, SubscriberRegistry};
    /// use switchboard::domain::ports::FixtureAuthenticator;
    /// use switchboard::inbound::http::state::HttpState;
    /// use switchboard::test_support::memory_logger;
    ///
    /// let (logger, _sink) = memory_logger();
    /// let registry = MessageRegistry::builder(Arc::new(SubscriberRegistry::builder().build()))
    ///     .build();
    /// let state = HttpState::new(Dispatcher::new(registry, &logger), Arc::new(FixtureAuthenticator));
    /// assert_eq!(state.dispatcher.registry().summary().commands, 0);
    /// ```
    pub fn new(dispatcher: Dispatcher, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            dispatcher,
            authenticator,
        }
    }
}
