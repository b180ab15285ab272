//! Process-local adapters backed by `tokio::sync::RwLock`.
//!
//! Used by the server until durable storage is wired and by tests that
//! exercise the full dispatch path. State is lost on restart.

mod audit_log;
mod organizations;

pub use audit_log::InMemoryAuditLog;
pub use organizations::InMemoryOrganizationRepository;
