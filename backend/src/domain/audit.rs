//! Audit trail records captured alongside domain events.
//!
//! An [`AuditEntry`] is built when the event is recorded, while the request
//! context is guaranteed to be in scope. Subscribers persist the captured
//! entry as-is and never consult the context themselves.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::messaging::{Event, EventSubscriber};
use crate::domain::ports::{AuditLogRepository, AuditLogRepositoryError};
use crate::domain::{Error, RequestContext, RequestId, UserId};

/// Kind of change recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Entity modified.
    Update,
    /// Entity removed.
    Delete,
}

/// One persisted audit trail row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    entity_type: String,
    entity_id: String,
    action: AuditAction,
    changes: Value,
    #[serde(serialize_with = "serialize_user_id")]
    performed_by_id: Option<UserId>,
    performed_by_email: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    #[serde(serialize_with = "serialize_request_id")]
    request_id: Option<RequestId>,
    created_at: DateTime<Utc>,
}

fn serialize_user_id<S: serde::Serializer>(
    value: &Option<UserId>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(id) => serializer.serialize_some(id.as_ref()),
        None => serializer.serialize_none(),
    }
}

fn serialize_request_id<S: serde::Serializer>(
    value: &Option<RequestId>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(id) => serializer.serialize_some(&id.to_string()),
        None => serializer.serialize_none(),
    }
}

impl AuditEntry {
    /// Build an entry from the ambient request context.
    ///
    /// Outside a scope the performer, origin and request fields stay empty.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use serde_json::json;
    /// use switchboard::domain::{AuditAction, AuditEntry};
    ///
    /// let entry = AuditEntry::capture("organization", "org-1", AuditAction::Create, json!({}), Utc::now());
    /// assert!(entry.request_id().is_none());
    /// assert_eq!(entry.entity_type(), "organization");
    /// ```
    pub fn capture(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: AuditAction,
        changes: Value,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        let mut entry = Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            action,
            changes,
            performed_by_id: None,
            performed_by_email: None,
            ip_address: None,
            user_agent: None,
            request_id: None,
            created_at: recorded_at,
        };
        RequestContext::with_current(|ctx| {
            entry.request_id = Some(ctx.request_id());
            entry.ip_address = ctx.origin().client_ip.clone();
            entry.user_agent = ctx.origin().user_agent.clone();
            if let Some(identity) = ctx.identity() {
                entry.performed_by_id = Some(identity.user_id().clone());
                entry.performed_by_email = Some(identity.email().to_owned());
            }
        });
        entry
    }

    /// Entity kind, such as `organization`.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Entity identifier.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Change kind.
    pub fn action(&self) -> AuditAction {
        self.action
    }

    /// Changed fields.
    pub fn changes(&self) -> &Value {
        &self.changes
    }

    /// Acting user, when authenticated.
    pub fn performed_by_id(&self) -> Option<&UserId> {
        self.performed_by_id.as_ref()
    }

    /// Acting user's email, when authenticated.
    pub fn performed_by_email(&self) -> Option<&str> {
        self.performed_by_email.as_deref()
    }

    /// Client address of the originating request.
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Client `User-Agent` of the originating request.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Request that caused the change.
    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    /// When the change was recorded.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Events carrying a captured audit entry.
pub trait Auditable {
    /// Entry captured when the event was recorded.
    fn audit_entry(&self) -> &AuditEntry;
}

/// Subscriber persisting the audit entry of every [`Auditable`] event.
pub struct AuditTrailSubscriber<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: ?Sized> AuditTrailSubscriber<R> {
    /// Subscriber writing to `repository`.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: ?Sized> Clone for AuditTrailSubscriber<R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.repository))
    }
}

#[async_trait]
impl<E, R> EventSubscriber<E> for AuditTrailSubscriber<R>
where
    E: Event + Auditable,
    R: AuditLogRepository + ?Sized,
{
    fn name(&self) -> &'static str {
        "AuditTrailSubscriber"
    }

    async fn handle(&self, event: &E) -> Result<(), Error> {
        self.repository
            .append(event.audit_entry())
            .await
            .map_err(map_audit_error)
    }
}

fn map_audit_error(error: AuditLogRepositoryError) -> Error {
    match error {
        AuditLogRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("audit log unavailable: {message}"))
        }
        AuditLogRepositoryError::Write { message } => {
            Error::internal(format!("audit log write failed: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use std::sync::Arc;

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::ports::MockAuditLogRepository;
    use crate::domain::{ErrorCode, Identity, RequestOrigin};
    use crate::test_support::FixtureClock;
    use mockable::Clock;

    #[derive(Debug, Clone)]
    struct Touched(AuditEntry);

    impl Event for Touched {}

    impl Auditable for Touched {
        fn audit_entry(&self) -> &AuditEntry {
            &self.0
        }
    }

    fn entry() -> AuditEntry {
        AuditEntry::capture(
            "widget",
            "w-1",
            AuditAction::Update,
            json!({ "name": "b" }),
            FixtureClock::epoch().utc(),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn capture_reads_the_ambient_context() {
        let origin = RequestOrigin {
            method: "PATCH".into(),
            path: "/widgets/w-1".into(),
            client_ip: Some("203.0.113.9".into()),
            user_agent: Some("curl/8".into()),
        };
        let ctx = Arc::new(RequestContext::new(None, origin));
        let request_id = ctx.request_id();
        let identity = Identity::new(UserId::new("u-1").expect("user id"), "ada@example.com")
            .expect("identity");

        let captured = RequestContext::scope(ctx, async move {
            RequestContext::attach_identity(identity);
            entry()
        })
        .await;

        assert_eq!(captured.request_id(), Some(request_id));
        assert_eq!(captured.performed_by_id().map(AsRef::as_ref), Some("u-1"));
        assert_eq!(captured.performed_by_email(), Some("ada@example.com"));
        assert_eq!(captured.ip_address(), Some("203.0.113.9"));
        assert_eq!(captured.user_agent(), Some("curl/8"));
        assert_eq!(captured.created_at(), FixtureClock::epoch().utc());
    }

    #[rstest]
    fn capture_outside_a_scope_leaves_context_fields_empty() {
        let captured = entry();
        assert!(captured.request_id().is_none());
        assert!(captured.performed_by_id().is_none());
        assert!(captured.ip_address().is_none());
    }

    #[rstest]
    fn entries_serialise_camel_case() {
        let value = serde_json::to_value(entry()).expect("serialises");
        assert_eq!(value["entityType"], "widget");
        assert_eq!(value["action"], "update");
        assert_eq!(value["performedById"], serde_json::Value::Null);
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
    }

    #[rstest]
    #[tokio::test]
    async fn subscriber_appends_the_captured_entry() {
        let event = Touched(entry());
        let expected = event.0.clone();
        let mut repository = MockAuditLogRepository::new();
        repository
            .expect_append()
            .withf(move |appended| *appended == expected)
            .times(1)
            .return_once(|_| Ok(()));
        let subscriber = AuditTrailSubscriber::new(Arc::new(repository));

        EventSubscriber::<Touched>::handle(&subscriber, &event)
            .await
            .expect("appended");
    }

    #[rstest]
    #[case(AuditLogRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(AuditLogRepositoryError::write("disk full"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn repository_failures_become_domain_errors(
        #[case] failure: AuditLogRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        let mut repository = MockAuditLogRepository::new();
        repository
            .expect_append()
            .return_once(move |_| Err(failure));
        let subscriber = AuditTrailSubscriber::new(Arc::new(repository));

        let err = EventSubscriber::<Touched>::handle(&subscriber, &Touched(entry()))
            .await
            .expect_err("append fails");
        assert_eq!(err.code(), expected);
    }
}
