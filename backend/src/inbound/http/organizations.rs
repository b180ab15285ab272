//! Organization HTTP handlers.
//!
//! ```text
//! POST  /api/v1/organizations
//! GET   /api/v1/organizations/{id}
//! PATCH /api/v1/organizations/{id}
//! ```
//!
//! Handlers translate payloads into commands and queries and hand them to the
//! dispatcher; they never call the organization services directly.

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::organizations::{
    CreateOrganization, GetOrganization, OrganizationId, OrganizationView, RenameOrganization,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Request payload for creating an organization.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    /// Display name, 2 to 80 characters once trimmed.
    #[schema(example = "Acme")]
    pub name: String,
}

/// Request payload for renaming an organization.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameOrganizationRequest {
    /// New display name.
    #[schema(example = "Acme Ltd")]
    pub name: String,
}

/// Response payload describing an organization.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OrganizationView> for OrganizationResponse {
    fn from(value: OrganizationView) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            owner_id: value.owner_id,
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

fn parse_organization_id(raw: &str) -> Result<OrganizationId, Error> {
    raw.parse().map_err(|_| {
        Error::invalid_request("organization id must be a UUID").with_details(json!({
            "field": "id",
            "value": raw,
            "code": "invalid_uuid",
        }))
    })
}

/// Create an organization owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = OrganizationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["organizations"],
    operation_id = "createOrganization"
)]
#[post("/organizations")]
pub async fn create_organization(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
    payload: web::Json<CreateOrganizationRequest>,
) -> ApiResult<HttpResponse> {
    let view = state
        .dispatcher
        .execute(CreateOrganization {
            name: payload.into_inner().name,
        })
        .await?;
    Ok(HttpResponse::Created().json(OrganizationResponse::from(view)))
}

/// Fetch one organization.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{id}",
    params(("id" = String, Path, description = "Organization UUID")),
    responses(
        (status = 200, description = "Organization", body = OrganizationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    security(()),
    tags = ["organizations"],
    operation_id = "getOrganization"
)]
#[get("/organizations/{id}")]
pub async fn get_organization(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<OrganizationResponse>> {
    let id = parse_organization_id(&path.into_inner())?;
    let view = state.dispatcher.query(GetOrganization { id }).await?;
    Ok(web::Json(view.into()))
}

/// Rename an organization.
#[utoipa::path(
    patch,
    path = "/api/v1/organizations/{id}",
    params(("id" = String, Path, description = "Organization UUID")),
    request_body = RenameOrganizationRequest,
    responses(
        (status = 200, description = "Renamed organization", body = OrganizationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["organizations"],
    operation_id = "renameOrganization"
)]
#[patch("/organizations/{id}")]
pub async fn rename_organization(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<RenameOrganizationRequest>,
) -> ApiResult<web::Json<OrganizationResponse>> {
    let id = parse_organization_id(&path.into_inner())?;
    let view = state
        .dispatcher
        .execute(RenameOrganization {
            id,
            name: payload.into_inner().name,
        })
        .await?;
    Ok(web::Json(view.into()))
}

/// JSON extractor settings reporting malformed bodies as domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request("request body is not valid JSON for this endpoint")
            .with_details(json!({ "reason": err.to_string() }))
            .into()
    })
}

/// Mount the organization routes on a scope or app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(create_organization)
        .service(get_organization)
        .service(rename_organization);
}
