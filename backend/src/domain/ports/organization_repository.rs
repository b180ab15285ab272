//! Port abstraction for organization persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::organizations::{Organization, OrganizationId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by organization repository adapters.
    pub enum OrganizationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "organization repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "organization repository query failed: {message}",
    }
}

/// Organization storage.
///
/// Adapters persist [`Organization::snapshot`] and rebuild aggregates with
/// [`Organization::restore`], so pending events are never stored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Insert or update an organization.
    async fn save(&self, organization: &Organization) -> Result<(), OrganizationRepositoryError>;

    /// Fetch an organization by identifier.
    async fn find_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError>;
}
