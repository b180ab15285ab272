//! Domain primitives, the message-dispatch core and the aggregates built on
//! it.
//!
//! Purpose: keep business rules and routing independent of transport. Inbound
//! adapters enter a [`RequestContext`] scope, build commands or queries and
//! hand them to [`messaging::Dispatcher`]; everything below that call reads
//! request identity from the ambient context rather than from parameters.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - RequestContext (alias to `request_context::RequestContext`): ambient
//!   per-request identity.
//! - DomainEvents (alias to `aggregate::DomainEvents`): per-aggregate event
//!   buffer.
//! - AuditEntry (alias to `audit::AuditEntry`): audit row captured with each
//!   event.

pub mod aggregate;
pub mod audit;
pub mod error;
pub mod identity;
pub mod messaging;
pub mod organizations;
pub mod ports;
pub mod request_context;

pub use self::aggregate::DomainEvents;
pub use self::audit::{AuditAction, AuditEntry, AuditTrailSubscriber, Auditable};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{Identity, IdentityValidationError, UserId};
pub use self::request_context::{
    CORRELATION_ID_MAX_LEN, CorrelationId, CorrelationIdValidationError, RequestContext,
    RequestId, RequestOrigin,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use switchboard::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
