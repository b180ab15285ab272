//! Outbound adapters implementing domain ports.
//!
//! Adapters translate between domain types and their storage representation.
//! They contain no business logic.
//!
//! - **memory**: process-local repositories backed by `tokio::sync::RwLock`.

pub mod memory;
