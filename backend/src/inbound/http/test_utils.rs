//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::{test as actix_test, web};

use crate::domain::Error;
use crate::domain::messaging::{Dispatcher, MessageRegistry, SubscriberRegistry};
use crate::domain::ports::Authenticator;
use crate::test_support::memory_logger;

use super::state::HttpState;

/// State with an empty dispatcher and the given authenticator.
pub fn http_state_with(authenticator: Arc<dyn Authenticator>) -> web::Data<HttpState> {
    let (logger, _sink) = memory_logger();
    let registry = MessageRegistry::builder(Arc::new(SubscriberRegistry::builder().build())).build();
    web::Data::new(HttpState::new(
        Dispatcher::new(registry, &logger),
        authenticator,
    ))
}

/// Decode an error payload from a response.
pub async fn parse_error<B: MessageBody>(res: ServiceResponse<B>) -> Error {
    let body = actix_test::read_body(res).await;
    serde_json::from_slice(&body).expect("error payload")
}
