//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::http::header::HeaderName;

use crate::config::{AppSettings, SettingsError};
use crate::logging::RedactionPolicy;

/// Validated configuration for creating the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) correlation_header: HeaderName,
    pub(crate) redaction: RedactionPolicy,
}

impl ServerConfig {
    /// Validate loaded settings into a server configuration.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when any configured value is invalid.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            correlation_header: settings.correlation_header()?,
            redaction: settings.redaction_policy()?,
        })
    }

    /// Socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Header read for caller-supplied correlation ids.
    #[must_use]
    pub fn correlation_header(&self) -> &HeaderName {
        &self.correlation_header
    }

    /// Redaction rules for log records.
    #[must_use]
    pub fn redaction(&self) -> &RedactionPolicy {
        &self.redaction
    }
}
