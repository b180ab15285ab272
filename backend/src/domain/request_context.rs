//! Request-scoped context for correlation and identity across a call tree.
//!
//! `RequestContext` carries the request id, correlation id, diagnostic origin
//! details and (after authentication) the caller's identity. It lives in
//! task-local storage so handlers, loggers and collaborators can read it
//! without explicit parameter threading.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Wrap
//! spawned work with [`RequestContext::propagate`] so the active context
//! follows it.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use futures_util::future::Either;
use thiserror::Error;
use tokio::task_local;
use tracing::warn;
use uuid::Uuid;

use crate::domain::identity::{Identity, UserId};

/// Upper bound on inbound correlation identifiers.
pub const CORRELATION_ID_MAX_LEN: usize = 128;

task_local! {
    /// Task-local storage for the active request context.
    static REQUEST_CONTEXT: Arc<RequestContext>;
}

/// Unique identifier generated for every inbound call.
///
/// # Examples
/// ```
/// use switchboard::domain::RequestId;
///
/// let id: RequestId = "00000000-0000-0000-0000-000000000000"
///     .parse()
///     .expect("valid UUID");
/// assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random request identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn generate() -> Self { Self(Uuid::new_v4()) }

    /// Construct a request identifier from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Validation errors for inbound correlation identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationIdValidationError {
    /// Value was blank once trimmed.
    #[error("correlation id must not be empty")]
    Empty,
    /// Value exceeded [`CORRELATION_ID_MAX_LEN`] characters.
    #[error("correlation id must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

/// Identifier tying together all output for one logical request.
///
/// Inbound callers may supply it; otherwise it equals the request id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Validate and construct a correlation id from caller-supplied input.
    ///
    /// # Examples
    /// ```
    /// use switchboard::domain::CorrelationId;
    ///
    /// let id = CorrelationId::new(" abc-123 ").expect("valid id");
    /// assert_eq!(id.as_str(), "abc-123");
    /// assert!(CorrelationId::new("   ").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, CorrelationIdValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CorrelationIdValidationError::Empty);
        }
        if trimmed.chars().count() > CORRELATION_ID_MAX_LEN {
            return Err(CorrelationIdValidationError::TooLong {
                max: CORRELATION_ID_MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<RequestId> for CorrelationId {
    fn from(value: RequestId) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Diagnostic details about where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    /// HTTP method or other transport verb.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Best-effort client address.
    pub client_ip: Option<String>,
    /// Client `User-Agent`, when supplied.
    pub user_agent: Option<String>,
}

/// Ambient identity record for one call tree.
///
/// ## Invariants
/// - `request_id` is unique per inbound call.
/// - `correlation_id` equals the request id unless the caller supplied one.
/// - The identity is attached at most once; later attachments are ignored.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    correlation_id: CorrelationId,
    origin: RequestOrigin,
    started_at: DateTime<Utc>,
    identity: OnceLock<Identity>,
}

impl RequestContext {
    /// Create a context for a new inbound call.
    ///
    /// # Examples
    /// ```
    /// use switchboard::domain::{RequestContext, RequestOrigin};
    ///
    /// let context = RequestContext::new(None, RequestOrigin::default());
    /// assert_eq!(
    ///     context.correlation_id().as_str(),
    ///     context.request_id().to_string()
    /// );
    /// ```
    #[must_use]
    pub fn new(correlation_id: Option<CorrelationId>, origin: RequestOrigin) -> Self {
        let request_id = RequestId::generate();
        Self {
            request_id,
            correlation_id: correlation_id.unwrap_or_else(|| CorrelationId::from(request_id)),
            origin,
            started_at: Utc::now(),
            identity: OnceLock::new(),
        }
    }

    /// Identifier generated for this call.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Correlation identifier resolved for this call.
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Origin details captured at ingress.
    pub fn origin(&self) -> &RequestOrigin {
        &self.origin
    }

    /// Time the context was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Identity attached by the authentication step, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// Shortcut for the attached user's id.
    pub fn user_id(&self) -> Option<&UserId> {
        self.identity().map(Identity::user_id)
    }

    /// Attach an identity to this context.
    ///
    /// Returns `false` when an identity was already attached; the original
    /// identity is kept.
    pub fn attach(&self, identity: Identity) -> bool {
        self.identity.set(identity).is_ok()
    }

    /// Returns the context in scope, if any.
    #[must_use]
    pub fn current() -> Option<Arc<Self>> {
        REQUEST_CONTEXT.try_with(Arc::clone).ok()
    }

    /// Run `f` against the context in scope without cloning the handle.
    pub fn with_current<R>(f: impl FnOnce(&Self) -> R) -> Option<R> {
        REQUEST_CONTEXT.try_with(|context| f(context.as_ref())).ok()
    }

    /// Attach an identity to the context in scope.
    ///
    /// Outside any scope this is a silent no-op returning `false`. A second
    /// attachment within the same call tree is ignored and logged.
    pub fn attach_identity(identity: Identity) -> bool {
        Self::with_current(|context| {
            let attached = context.attach(identity);
            if !attached {
                warn!(
                    request_id = %context.request_id,
                    "identity already attached; ignoring re-attachment"
                );
            }
            attached
        })
        .unwrap_or(false)
    }

    /// Execute the provided future with `context` in scope.
    ///
    /// Scopes nest; the outer context is visible again once `fut` completes.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use switchboard::domain::{RequestContext, RequestOrigin};
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let context = Arc::new(RequestContext::new(None, RequestOrigin::default()));
    /// let expected = context.request_id();
    /// let observed = RequestContext::scope(context, async {
    ///     RequestContext::current().map(|ctx| ctx.request_id())
    /// })
    /// .await;
    /// assert_eq!(observed, Some(expected));
    /// # });
    /// ```
    pub async fn scope<Fut>(context: Arc<Self>, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        REQUEST_CONTEXT.scope(context, fut).await
    }

    /// Run a synchronous closure with `context` in scope.
    pub fn sync_scope<R>(context: Arc<Self>, f: impl FnOnce() -> R) -> R {
        REQUEST_CONTEXT.sync_scope(context, f)
    }

    /// Bind `fut` to the context currently in scope.
    ///
    /// Use this before handing work to `tokio::spawn` or any executor that
    /// polls the future outside the current task. Without a context in scope
    /// the future is returned unchanged.
    pub fn propagate<Fut>(fut: Fut) -> impl Future<Output = Fut::Output>
    where
        Fut: Future,
    {
        match Self::current() {
            Some(context) => Either::Left(REQUEST_CONTEXT.scope(context, fut)),
            None => Either::Right(fut),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn context() -> Arc<RequestContext> {
        Arc::new(RequestContext::new(None, RequestOrigin::default()))
    }

    fn identity(user: &str) -> Identity {
        let user_id = UserId::new(user).expect("valid user id");
        Identity::new(user_id, format!("{user}@example.com")).expect("valid identity")
    }

    fn current_request_id() -> Option<RequestId> {
        RequestContext::current().map(|ctx| ctx.request_id())
    }

    #[rstest]
    #[tokio::test]
    async fn current_is_none_out_of_scope() {
        assert!(RequestContext::current().is_none());
        assert!(RequestContext::with_current(|ctx| ctx.request_id()).is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn current_reflects_scope(context: Arc<RequestContext>) {
        let expected = context.request_id();
        let observed = RequestContext::scope(context, async { current_request_id() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[rstest]
    #[tokio::test]
    async fn context_survives_suspension_points(context: Arc<RequestContext>) {
        let expected = context.request_id();
        let observed = RequestContext::scope(context, async {
            tokio::task::yield_now().await;
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            current_request_id()
        })
        .await;
        assert_eq!(observed, Some(expected));
    }

    #[rstest]
    #[tokio::test]
    async fn nested_scope_takes_precedence_and_restores_outer(context: Arc<RequestContext>) {
        let outer_id = context.request_id();
        let inner = Arc::new(RequestContext::new(None, RequestOrigin::default()));
        let inner_id = inner.request_id();

        let (during, after) = RequestContext::scope(context, async move {
            let during = RequestContext::scope(inner, async { current_request_id() }).await;
            (during, current_request_id())
        })
        .await;

        assert_eq!(during, Some(inner_id));
        assert_eq!(after, Some(outer_id));
    }

    #[rstest]
    fn correlation_defaults_to_request_id(context: Arc<RequestContext>) {
        assert_eq!(
            context.correlation_id().as_str(),
            context.request_id().to_string()
        );
    }

    #[rstest]
    fn supplied_correlation_is_kept() {
        let correlation = CorrelationId::new("abc-123").expect("valid correlation id");
        let context = RequestContext::new(Some(correlation), RequestOrigin::default());
        assert_eq!(context.correlation_id().as_str(), "abc-123");
        assert_ne!(context.request_id().to_string(), "abc-123");
    }

    #[rstest]
    fn correlation_rejects_oversized_values() {
        let raw = "x".repeat(CORRELATION_ID_MAX_LEN + 1);
        assert_eq!(
            CorrelationId::new(raw),
            Err(CorrelationIdValidationError::TooLong {
                max: CORRELATION_ID_MAX_LEN
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn attach_identity_outside_scope_is_noop() {
        assert!(!RequestContext::attach_identity(identity("ada")));
    }

    #[rstest]
    #[tokio::test]
    async fn identity_attaches_at_most_once(context: Arc<RequestContext>) {
        let observed = RequestContext::scope(Arc::clone(&context), async {
            let first = RequestContext::attach_identity(identity("ada"));
            let second = RequestContext::attach_identity(identity("grace"));
            (first, second)
        })
        .await;

        assert_eq!(observed, (true, false));
        assert_eq!(
            context.user_id().map(AsRef::as_ref),
            Some("ada"),
            "first identity wins"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn propagate_carries_context_into_spawned_tasks(context: Arc<RequestContext>) {
        let expected = context.request_id();
        let (bare, propagated) = RequestContext::scope(context, async {
            let bare = tokio::spawn(async { current_request_id() })
                .await
                .expect("bare task joins");
            let propagated = tokio::spawn(RequestContext::propagate(async {
                current_request_id()
            }))
            .await
            .expect("propagated task joins");
            (bare, propagated)
        })
        .await;

        assert_eq!(bare, None, "task-locals are not inherited by tokio::spawn");
        assert_eq!(propagated, Some(expected));
    }

    #[rstest]
    #[tokio::test]
    async fn propagate_without_scope_is_passthrough() {
        let observed = RequestContext::propagate(async { current_request_id() }).await;
        assert!(observed.is_none());
    }

    #[rstest]
    fn sync_scope_exposes_context(context: Arc<RequestContext>) {
        let expected = context.request_id();
        let observed = RequestContext::sync_scope(context, current_request_id);
        assert_eq!(observed, Some(expected));
    }
}
