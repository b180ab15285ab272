//! Server construction and dependency wiring.
//!
//! The construction graph is explicit: adapters are built first, subscribers
//! are registered against a shared [`SubscriberRegistry`], command services
//! receive an [`EventPublisher`] over that registry, and the handlers are
//! finally registered with the [`Dispatcher`]. Duplicate registrations abort
//! startup.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, HttpServer, web};
use mockable::{Clock, DefaultClock};
use serde_json::json;
use utoipa::OpenApi;

use crate::doc::ApiDoc;
use crate::domain::AuditTrailSubscriber;
use crate::domain::messaging::{
    Dispatcher, EventPublisher, MessageRegistry, RegistryError, SubscriberRegistry,
};
use crate::domain::organizations::{
    CreateOrganization, GetOrganization, OrganizationActivityLogger, OrganizationCommandService,
    OrganizationEvent, OrganizationQueryService, RenameOrganization,
};
use crate::domain::ports::{
    AuditLogRepository, Authenticator, FixtureAuthenticator, OrganizationRepository,
};
use crate::inbound::http::organizations;
use crate::inbound::http::state::HttpState;
use crate::logging::Logger;
use crate::middleware::RequestContextLayer;
use crate::outbound::memory::{InMemoryAuditLog, InMemoryOrganizationRepository};

/// Port implementations wired into the dispatcher.
#[derive(Clone)]
pub struct Adapters {
    /// Organization persistence.
    pub organizations: Arc<dyn OrganizationRepository>,
    /// Audit trail persistence.
    pub audit_log: Arc<dyn AuditLogRepository>,
    /// Bearer token resolution.
    pub authenticator: Arc<dyn Authenticator>,
    /// Time source for aggregate timestamps.
    pub clock: Arc<dyn Clock>,
}

impl Adapters {
    /// Process-local adapters with the fixture authenticator.
    pub fn in_memory() -> Self {
        Self {
            organizations: Arc::new(InMemoryOrganizationRepository::new()),
            audit_log: Arc::new(InMemoryAuditLog::new()),
            authenticator: Arc::new(FixtureAuthenticator),
            clock: Arc::new(DefaultClock),
        }
    }
}

/// Register every subscriber and handler and return the dispatcher.
///
/// # Errors
/// Returns [`RegistryError::DuplicateHandler`] when a command or query is
/// registered twice.
pub fn build_dispatcher(logger: &Logger, adapters: &Adapters) -> Result<Dispatcher, RegistryError> {
    let events = Arc::new(
        SubscriberRegistry::builder()
            .subscribe::<OrganizationEvent, _>(AuditTrailSubscriber::new(Arc::clone(
                &adapters.audit_log,
            )))
            .subscribe::<OrganizationEvent, _>(OrganizationActivityLogger::new(logger))
            .build(),
    );
    let publisher = EventPublisher::new(Arc::clone(&events), logger);
    let commands = Arc::new(OrganizationCommandService::new(
        Arc::clone(&adapters.organizations),
        publisher,
        Arc::clone(&adapters.clock),
    ));

    let registry = MessageRegistry::builder(events)
        .command_shared::<CreateOrganization>(commands.clone())?
        .command_shared::<RenameOrganization>(commands)?
        .query::<GetOrganization, _>(OrganizationQueryService::new(Arc::clone(
            &adapters.organizations,
        )))?
        .build();

    let summary = registry.summary();
    logger.log(
        "dispatcher ready",
        Some(json!({
            "commands": summary.commands,
            "queries": summary.queries,
            "eventTypes": summary.event_types,
        })),
    );
    Ok(Dispatcher::new(registry, logger))
}

async fn openapi_document() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Build the application: request context middleware, the versioned API
/// scope and the OpenAPI document.
pub fn build_app(
    state: web::Data<HttpState>,
    context: RequestContextLayer,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(context)
        .service(web::scope("/api/v1").configure(organizations::configure))
        .route("/api-docs/openapi.json", web::get().to(openapi_document))
}

/// Construct an Actix HTTP server over the given dispatcher.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    config: &ServerConfig,
    logger: &Logger,
    dispatcher: Dispatcher,
    authenticator: Arc<dyn Authenticator>,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState::new(dispatcher, authenticator));
    let context = RequestContextLayer::new(config.correlation_header().clone(), logger);
    logger.log(
        "binding HTTP server",
        Some(json!({ "bindAddr": config.bind_addr().to_string() })),
    );

    let server = HttpServer::new(move || build_app(state.clone(), context.clone()))
        .bind(config.bind_addr())?
        .run();
    Ok(server)
}
