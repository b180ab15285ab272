//! Organization aggregate and its lifecycle events.
//!
//! The aggregate records [`OrganizationEvent`]s into its [`DomainEvents`]
//! buffer; the command services in [`commands`] persist the aggregate and
//! then publish the flushed events in order.

pub mod commands;
mod subscribers;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::messaging::Event;
use crate::domain::{AuditAction, AuditEntry, Auditable, DomainEvents, Error, UserId};

pub use commands::{
    CreateOrganization, GetOrganization, OrganizationCommandService, OrganizationQueryService,
    RenameOrganization,
};
pub use subscribers::OrganizationActivityLogger;

/// Minimum organization name length in characters.
pub const ORGANIZATION_NAME_MIN: usize = 2;
/// Maximum organization name length in characters.
pub const ORGANIZATION_NAME_MAX: usize = 80;

const ENTITY_TYPE: &str = "organization";

/// Validation errors for organization primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrganizationValidationError {
    /// Name shorter than [`ORGANIZATION_NAME_MIN`] once trimmed.
    #[error("organization name must be at least {min} characters")]
    NameTooShort {
        /// Lower bound.
        min: usize,
    },
    /// Name longer than [`ORGANIZATION_NAME_MAX`] once trimmed.
    #[error("organization name must be at most {max} characters")]
    NameTooLong {
        /// Upper bound.
        max: usize,
    },
    /// Identifier was not a UUID.
    #[error("organization id must be a UUID")]
    InvalidId,
}

/// Organization identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrganizationId(Uuid);

impl OrganizationId {
    /// Fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OrganizationId {
    type Err = OrganizationValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| OrganizationValidationError::InvalidId)
    }
}

/// Display name of an organization.
///
/// ## Invariants
/// - Trimmed, between [`ORGANIZATION_NAME_MIN`] and [`ORGANIZATION_NAME_MAX`]
///   characters.
///
/// # Examples
/// ```
/// use switchboard::domain::organizations::OrganizationName;
///
/// let name = OrganizationName::new("  Acme  ").expect("valid name");
/// assert_eq!(name.as_ref(), "Acme");
/// assert!(OrganizationName::new("A").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrganizationName(String);

impl OrganizationName {
    /// Validate and construct a name.
    pub fn new(value: impl Into<String>) -> Result<Self, OrganizationValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let length = trimmed.chars().count();
        if length < ORGANIZATION_NAME_MIN {
            return Err(OrganizationValidationError::NameTooShort {
                min: ORGANIZATION_NAME_MIN,
            });
        }
        if length > ORGANIZATION_NAME_MAX {
            return Err(OrganizationValidationError::NameTooLong {
                max: ORGANIZATION_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for OrganizationName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OrganizationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle events recorded by [`Organization`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrganizationEvent {
    /// A new organization was created.
    Created {
        /// Created organization.
        organization_id: OrganizationId,
        /// Initial name.
        name: OrganizationName,
        /// Creating user.
        owner_id: UserId,
        /// Audit row captured at creation.
        audit: AuditEntry,
    },
    /// An organization's name changed.
    Renamed {
        /// Renamed organization.
        organization_id: OrganizationId,
        /// Name before the change.
        previous_name: OrganizationName,
        /// Name after the change.
        name: OrganizationName,
        /// Audit row captured at rename.
        audit: AuditEntry,
    },
}

impl OrganizationEvent {
    /// Affected organization.
    pub fn organization_id(&self) -> OrganizationId {
        match self {
            Self::Created {
                organization_id, ..
            }
            | Self::Renamed {
                organization_id, ..
            } => *organization_id,
        }
    }

    /// Dotted event name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "organization.created",
            Self::Renamed { .. } => "organization.renamed",
        }
    }
}

impl Event for OrganizationEvent {}

impl Auditable for OrganizationEvent {
    fn audit_entry(&self) -> &AuditEntry {
        match self {
            Self::Created { audit, .. } | Self::Renamed { audit, .. } => audit,
        }
    }
}

/// Persisted organization state without pending events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationSnapshot {
    /// Identifier.
    pub id: OrganizationId,
    /// Current name.
    pub name: OrganizationName,
    /// Creating user.
    pub owner_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Organization aggregate.
#[derive(Debug, Clone)]
pub struct Organization {
    id: OrganizationId,
    name: OrganizationName,
    owner_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: DomainEvents<OrganizationEvent>,
}

impl Organization {
    /// Create an organization and record [`OrganizationEvent::Created`].
    pub fn create(
        id: OrganizationId,
        name: OrganizationName,
        owner_id: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        let audit = AuditEntry::capture(
            ENTITY_TYPE,
            id.to_string(),
            AuditAction::Create,
            json!({ "name": name.as_ref(), "ownerId": owner_id.as_ref() }),
            at,
        );
        let mut organization = Self {
            id,
            name: name.clone(),
            owner_id: owner_id.clone(),
            created_at: at,
            updated_at: at,
            events: DomainEvents::default(),
        };
        organization.events.record(OrganizationEvent::Created {
            organization_id: id,
            name,
            owner_id,
            audit,
        });
        organization
    }

    /// Rebuild an aggregate from storage with an empty event buffer.
    pub fn restore(snapshot: OrganizationSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            owner_id: snapshot.owner_id,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            events: DomainEvents::default(),
        }
    }

    /// Rename and record [`OrganizationEvent::Renamed`].
    ///
    /// Fails with `invalid_request` when `name` equals the current name.
    pub fn rename(&mut self, name: OrganizationName, at: DateTime<Utc>) -> Result<(), Error> {
        if name == self.name {
            return Err(Error::invalid_request("organization already has this name")
                .with_details(json!({ "field": "name" })));
        }
        let previous_name = std::mem::replace(&mut self.name, name.clone());
        self.updated_at = at;
        let audit = AuditEntry::capture(
            ENTITY_TYPE,
            self.id.to_string(),
            AuditAction::Update,
            json!({ "name": { "from": previous_name.as_ref(), "to": name.as_ref() } }),
            at,
        );
        self.events.record(OrganizationEvent::Renamed {
            organization_id: self.id,
            previous_name,
            name,
            audit,
        });
        Ok(())
    }

    /// Identifier.
    pub fn id(&self) -> OrganizationId {
        self.id
    }

    /// Current name.
    pub fn name(&self) -> &OrganizationName {
        &self.name
    }

    /// Creating user.
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification time.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Events recorded since the last flush.
    pub fn pending_events(&self) -> &[OrganizationEvent] {
        self.events.pending()
    }

    /// Drain recorded events in order.
    pub fn flush_events(&mut self) -> Vec<OrganizationEvent> {
        self.events.flush()
    }

    /// State to persist.
    pub fn snapshot(&self) -> OrganizationSnapshot {
        OrganizationSnapshot {
            id: self.id,
            name: self.name.clone(),
            owner_id: self.owner_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read model returned by organization commands and queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationView {
    /// Identifier.
    pub id: Uuid,
    /// Current name.
    pub name: String,
    /// Creating user.
    pub owner_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<&Organization> for OrganizationView {
    fn from(value: &Organization) -> Self {
        Self {
            id: *value.id.as_uuid(),
            name: value.name.to_string(),
            owner_id: value.owner_id.to_string(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
