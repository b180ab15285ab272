//! Organization commands, queries and the services handling them.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use super::{
    Organization, OrganizationId, OrganizationName, OrganizationValidationError, OrganizationView,
};
use crate::domain::messaging::{Command, CommandHandler, EventPublisher, Query, QueryHandler};
use crate::domain::ports::{OrganizationRepository, OrganizationRepositoryError};
use crate::domain::{Error, RequestContext, UserId};

/// Create an organization owned by the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrganization {
    /// Requested name, validated by the handler.
    pub name: String,
}

impl Command for CreateOrganization {
    type Output = OrganizationView;
}

/// Rename an existing organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOrganization {
    /// Target organization.
    pub id: OrganizationId,
    /// Requested name, validated by the handler.
    pub name: String,
}

impl Command for RenameOrganization {
    type Output = OrganizationView;
}

/// Fetch one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOrganization {
    /// Target organization.
    pub id: OrganizationId,
}

impl Query for GetOrganization {
    type Output = OrganizationView;
}

/// Handles organization commands.
///
/// Each command persists the aggregate first and only then publishes the
/// events it recorded, so subscribers never observe an unsaved change.
pub struct OrganizationCommandService<R: ?Sized> {
    repository: Arc<R>,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl<R: ?Sized> OrganizationCommandService<R> {
    /// Create a new command service.
    pub fn new(repository: Arc<R>, publisher: EventPublisher, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            publisher,
            clock,
        }
    }
}

impl<R> OrganizationCommandService<R>
where
    R: OrganizationRepository + ?Sized,
{
    async fn commit(&self, organization: &mut Organization) -> Result<OrganizationView, Error> {
        self.repository
            .save(organization)
            .await
            .map_err(map_repository_error)?;
        self.publisher
            .publish_all(organization.flush_events())
            .await;
        Ok(OrganizationView::from(&*organization))
    }
}

#[async_trait]
impl<R> CommandHandler<CreateOrganization> for OrganizationCommandService<R>
where
    R: OrganizationRepository + ?Sized,
{
    async fn handle(&self, command: CreateOrganization) -> Result<OrganizationView, Error> {
        let owner_id = acting_user()?;
        let name = OrganizationName::new(command.name).map_err(map_validation_error)?;
        let mut organization =
            Organization::create(OrganizationId::random(), name, owner_id, self.clock.utc());
        self.commit(&mut organization).await
    }
}

#[async_trait]
impl<R> CommandHandler<RenameOrganization> for OrganizationCommandService<R>
where
    R: OrganizationRepository + ?Sized,
{
    async fn handle(&self, command: RenameOrganization) -> Result<OrganizationView, Error> {
        acting_user()?;
        let name = OrganizationName::new(command.name).map_err(map_validation_error)?;
        let mut organization = self
            .repository
            .find_by_id(&command.id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(command.id))?;
        organization.rename(name, self.clock.utc())?;
        self.commit(&mut organization).await
    }
}

/// Handles organization queries.
pub struct OrganizationQueryService<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: ?Sized> OrganizationQueryService<R> {
    /// Create a new query service.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R> QueryHandler<GetOrganization> for OrganizationQueryService<R>
where
    R: OrganizationRepository + ?Sized,
{
    async fn handle(&self, query: GetOrganization) -> Result<OrganizationView, Error> {
        self.repository
            .find_by_id(&query.id)
            .await
            .map_err(map_repository_error)?
            .map(|organization| OrganizationView::from(&organization))
            .ok_or_else(|| not_found(query.id))
    }
}

fn acting_user() -> Result<UserId, Error> {
    RequestContext::with_current(|ctx| ctx.user_id().cloned())
        .flatten()
        .ok_or_else(|| Error::unauthorized("authentication required"))
}

fn not_found(id: OrganizationId) -> Error {
    Error::not_found(format!("organization {id} not found"))
        .with_details(json!({ "organizationId": id.to_string() }))
}

fn map_validation_error(error: OrganizationValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": "name" }))
}

fn map_repository_error(error: OrganizationRepositoryError) -> Error {
    match error {
        OrganizationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("organization store unavailable: {message}"))
        }
        OrganizationRepositoryError::Query { message } => {
            Error::internal(format!("organization store error: {message}"))
        }
    }
}
