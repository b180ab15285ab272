//! In-memory organization repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::organizations::{Organization, OrganizationId, OrganizationSnapshot};
use crate::domain::ports::{OrganizationRepository, OrganizationRepositoryError};

/// Stores organization snapshots keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationRepository {
    rows: RwLock<HashMap<OrganizationId, OrganizationSnapshot>>,
}

impl InMemoryOrganizationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored organizations.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn save(&self, organization: &Organization) -> Result<(), OrganizationRepositoryError> {
        let snapshot = organization.snapshot();
        self.rows.write().await.insert(snapshot.id, snapshot);
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError> {
        Ok(self
            .rows
            .read()
            .await
            .get(id)
            .cloned()
            .map(Organization::restore))
    }
}
