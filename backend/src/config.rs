//! Application settings loaded via OrthoConfig.
//!
//! Values are layered from CLI flags, `SWITCHBOARD_*` environment variables
//! and an optional configuration file. List values accept comma-separated
//! environment variables. The accessors validate raw values and fall back
//! to defaults.

use std::net::{AddrParseError, SocketAddr};

use actix_web::http::header::HeaderName;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::logging::{RedactionPathError, RedactionPolicy};

/// Address bound when `bind_addr` is not configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Inbound header carrying a caller-supplied correlation id.
pub const DEFAULT_CORRELATION_HEADER: &str = "X-Correlation-ID";

/// Errors raised while validating configured values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address `{value}`: {source}")]
    InvalidBindAddr {
        /// Configured value.
        value: String,
        /// Parser failure.
        #[source]
        source: AddrParseError,
    },
    /// `correlation_header` is not a valid HTTP header name.
    #[error("invalid correlation header name `{value}`")]
    InvalidHeaderName {
        /// Configured value.
        value: String,
    },
    /// An entry of `redact_paths` failed to parse.
    #[error(transparent)]
    InvalidRedactionPath(#[from] RedactionPathError),
}

/// Settings controlling the HTTP server and log enrichment.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SWITCHBOARD")]
pub struct AppSettings {
    /// Socket address to bind, such as `127.0.0.1:8080`.
    pub bind_addr: Option<String>,
    /// Header read for a caller-supplied correlation id.
    pub correlation_header: Option<String>,
    /// Keys added to the default redaction list.
    pub redact_keys: Option<Vec<String>>,
    /// Dotted paths added to the default redaction paths.
    pub redact_paths: Option<Vec<String>>,
    /// Emit JSON log lines instead of human-readable ones.
    #[ortho_config(default = true)]
    pub log_json: bool,
}

impl AppSettings {
    /// Validated bind address, falling back to [`DEFAULT_BIND_ADDR`].
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR).trim();
        value
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
                source,
            })
    }

    /// Validated correlation header, falling back to
    /// [`DEFAULT_CORRELATION_HEADER`].
    pub fn correlation_header(&self) -> Result<HeaderName, SettingsError> {
        let value = self
            .correlation_header
            .as_deref()
            .unwrap_or(DEFAULT_CORRELATION_HEADER)
            .trim();
        HeaderName::from_bytes(value.as_bytes()).map_err(|_| SettingsError::InvalidHeaderName {
            value: value.to_owned(),
        })
    }

    /// Default redaction rules extended with the configured keys and paths.
    pub fn redaction_policy(&self) -> Result<RedactionPolicy, SettingsError> {
        RedactionPolicy::default()
            .with_keys(list_entries(self.redact_keys.as_deref()))
            .with_paths(list_entries(self.redact_paths.as_deref()))
            .map_err(SettingsError::from)
    }

    /// Whether logs are JSON formatted. Defaults to `true`.
    pub fn log_json(&self) -> bool {
        self.log_json
    }
}

fn list_entries(raw: Option<&[String]>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
}
