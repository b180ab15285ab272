//! Destinations for enriched log records.

use std::fmt;

use serde_json::{Map, Value};

use super::LogLevel;

/// One fully merged and redacted record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Component, metadata, stack and context fields.
    pub fields: Map<String, Value>,
}

/// Receives records from [`super::Logger`].
pub trait LogSink: Send + Sync {
    /// Write one record. Must not panic.
    fn emit(&self, entry: &LogEntry);
}

/// Sink forwarding records to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

struct Fields<'a>(&'a Map<String, Value>);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl LogSink for TracingSink {
    fn emit(&self, entry: &LogEntry) {
        let component = entry
            .fields
            .get("component")
            .and_then(Value::as_str)
            .unwrap_or("app");
        let record = Fields(&entry.fields);
        let message = entry.message.as_str();
        match entry.level {
            LogLevel::Error => tracing::error!(component, record = %record, "{message}"),
            LogLevel::Warn => tracing::warn!(component, record = %record, "{message}"),
            LogLevel::Log => tracing::info!(component, record = %record, "{message}"),
            LogLevel::Debug => tracing::debug!(component, record = %record, "{message}"),
            LogLevel::Verbose => tracing::trace!(component, record = %record, "{message}"),
        }
    }
}
