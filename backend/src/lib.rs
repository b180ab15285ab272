//! In-process message dispatch with request-scoped context.
//!
//! Commands, queries and events are routed through
//! [`domain::messaging::Dispatcher`]; request identity travels with the call
//! tree through [`domain::RequestContext`] and enriches every
//! [`logging::Logger`] record.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod logging;
pub mod middleware;
pub mod outbound;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
/// Middleware entering the request context scope.
pub use middleware::RequestContextLayer;
