//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod audit_log_repository;
mod authenticator;
mod organization_repository;

#[cfg(test)]
pub use audit_log_repository::MockAuditLogRepository;
pub use audit_log_repository::{AuditLogRepository, AuditLogRepositoryError};
#[cfg(test)]
pub use authenticator::MockAuthenticator;
pub use authenticator::{
    Authenticator, BearerToken, FIXTURE_TOKEN, FIXTURE_USER_EMAIL, FIXTURE_USER_ID,
    FixtureAuthenticator,
};
#[cfg(test)]
pub use organization_repository::MockOrganizationRepository;
pub use organization_repository::{OrganizationRepository, OrganizationRepositoryError};
