//! In-memory audit log.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::AuditEntry;
use crate::domain::ports::{AuditLogRepository, AuditLogRepositoryError};

/// Append-only vector of audit entries.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry in append order.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogRepositoryError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEntry>, AuditLogRepositoryError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.entity_type() == entity_type && entry.entity_id() == entity_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::AuditAction;
    use crate::test_support::FixtureClock;
    use mockable::Clock;
    use rstest::rstest;
    use serde_json::json;

    fn entry(entity_id: &str, action: AuditAction) -> AuditEntry {
        AuditEntry::capture(
            "organization",
            entity_id,
            action,
            json!({}),
            FixtureClock::epoch().utc(),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn list_for_entity_filters_and_keeps_order() {
        let log = InMemoryAuditLog::new();
        log.append(&entry("a", AuditAction::Create)).await.expect("append");
        log.append(&entry("b", AuditAction::Create)).await.expect("append");
        log.append(&entry("a", AuditAction::Update)).await.expect("append");

        let actions: Vec<_> = log
            .list_for_entity("organization", "a")
            .await
            .expect("list")
            .iter()
            .map(AuditEntry::action)
            .collect();

        assert_eq!(actions, vec![AuditAction::Create, AuditAction::Update]);
        assert_eq!(log.entries().await.len(), 3);
        assert!(log
            .list_for_entity("user", "a")
            .await
            .expect("list")
            .is_empty());
    }
}
