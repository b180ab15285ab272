//! Port abstraction for audit trail storage.
use async_trait::async_trait;

use crate::domain::AuditEntry;

use super::define_port_error;

define_port_error! {
    /// Errors raised by audit log adapters.
    pub enum AuditLogRepositoryError {
        /// Store could not be reached.
        Connection { message: String } => "audit log connection failed: {message}",
        /// Append failed after connecting.
        Write { message: String } => "audit log write failed: {message}",
    }
}

/// Append-only audit trail storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Persist one entry.
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogRepositoryError>;

    /// Entries for one entity in append order.
    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEntry>, AuditLogRepositoryError>;
}
