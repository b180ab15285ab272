//! Organization event subscribers.

use async_trait::async_trait;
use serde_json::json;

use super::OrganizationEvent;
use crate::domain::Error;
use crate::domain::messaging::EventSubscriber;
use crate::logging::Logger;

/// Writes one log record per organization lifecycle event.
#[derive(Debug, Clone)]
pub struct OrganizationActivityLogger {
    logger: Logger,
}

impl OrganizationActivityLogger {
    /// Subscriber logging through a child of `logger`.
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.child("OrganizationActivity"),
        }
    }
}

#[async_trait]
impl EventSubscriber<OrganizationEvent> for OrganizationActivityLogger {
    fn name(&self) -> &'static str {
        "OrganizationActivityLogger"
    }

    async fn handle(&self, event: &OrganizationEvent) -> Result<(), Error> {
        let metadata = match event {
            OrganizationEvent::Created {
                organization_id,
                name,
                owner_id,
                ..
            } => json!({
                "event": event.kind(),
                "organizationId": organization_id.to_string(),
                "name": name.as_ref(),
                "ownerId": owner_id.as_ref(),
            }),
            OrganizationEvent::Renamed {
                organization_id,
                previous_name,
                name,
                ..
            } => json!({
                "event": event.kind(),
                "organizationId": organization_id.to_string(),
                "previousName": previous_name.as_ref(),
                "name": name.as_ref(),
            }),
        };
        self.logger.log(event.kind(), Some(metadata));
        Ok(())
    }
}
