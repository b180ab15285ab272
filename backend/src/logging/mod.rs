//! Context-enriched structured logging.
//!
//! [`Logger`] merges three layers into every record before it reaches the
//! sink: the component label, the caller's metadata and the identity held by
//! the ambient [`RequestContext`]. The merged record is then passed through
//! the [`RedactionPolicy`]. Context fields are written last, so a caller
//! cannot spoof `requestId` through metadata.

mod redaction;
mod sink;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::RequestContext;

pub use redaction::{
    DEFAULT_REDACT_KEYS, DEFAULT_REDACT_PATHS, RedactionPath, RedactionPathError, RedactionPolicy,
};
pub use sink::{LogEntry, LogSink, TracingSink};

/// Severity of a log record, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Failures that need attention.
    Error,
    /// Recoverable anomalies.
    Warn,
    /// Normal operational events.
    Log,
    /// Diagnostic detail.
    Debug,
    /// Fine-grained tracing.
    Verbose,
}

impl LogLevel {
    /// Lower-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Log => "log",
            Self::Debug => "debug",
            Self::Verbose => "verbose",
        }
    }
}

/// Second argument of [`Logger::error`]: nothing, a stack trace or metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    /// No extra detail.
    None,
    /// A stack trace rendered into the `stack` field.
    Trace(String),
    /// Structured metadata merged into the record.
    Metadata(Value),
}

impl From<Option<Value>> for ErrorDetail {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::None, Self::Metadata)
    }
}

impl From<Value> for ErrorDetail {
    fn from(value: Value) -> Self {
        Self::Metadata(value)
    }
}

impl From<&str> for ErrorDetail {
    fn from(value: &str) -> Self {
        Self::Trace(value.to_owned())
    }
}

impl From<String> for ErrorDetail {
    fn from(value: String) -> Self {
        Self::Trace(value)
    }
}

/// Structured logger bound to an optional component label.
///
/// Cloning is cheap; children share the sink and redaction policy, both of
/// which are immutable.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use switchboard::logging::{Logger, RedactionPolicy};
/// use switchboard::test_support::MemorySink;
///
/// let sink = Arc::new(MemorySink::default());
/// let logger = Logger::new(sink.clone(), RedactionPolicy::default()).child("Billing");
/// logger.log("charged", Some(json!({ "amount": 5, "password": "hunter2" })));
///
/// let entry = &sink.entries()[0];
/// assert_eq!(entry.fields["component"], "Billing");
/// assert!(!entry.fields.contains_key("password"));
/// ```
#[derive(Clone)]
pub struct Logger {
    component: Option<Arc<str>>,
    sink: Arc<dyn LogSink>,
    redaction: Arc<RedactionPolicy>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Root logger writing to `sink`.
    pub fn new(sink: Arc<dyn LogSink>, redaction: RedactionPolicy) -> Self {
        Self {
            component: None,
            sink,
            redaction: Arc::new(redaction),
        }
    }

    /// Root logger forwarding to `tracing`.
    pub fn tracing(redaction: RedactionPolicy) -> Self {
        Self::new(Arc::new(TracingSink), redaction)
    }

    /// Logger labelled with `component`. The label replaces any inherited one.
    #[must_use]
    pub fn child(&self, component: impl Into<String>) -> Self {
        Self {
            component: Some(Arc::from(component.into())),
            sink: Arc::clone(&self.sink),
            redaction: Arc::clone(&self.redaction),
        }
    }

    /// Component label, if any.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Emit at [`LogLevel::Log`].
    pub fn log(&self, message: &str, metadata: Option<Value>) {
        self.emit(LogLevel::Log, message, metadata, None);
    }

    /// Emit at [`LogLevel::Warn`].
    pub fn warn(&self, message: &str, metadata: Option<Value>) {
        self.emit(LogLevel::Warn, message, metadata, None);
    }

    /// Emit at [`LogLevel::Debug`].
    pub fn debug(&self, message: &str, metadata: Option<Value>) {
        self.emit(LogLevel::Debug, message, metadata, None);
    }

    /// Emit at [`LogLevel::Verbose`].
    pub fn verbose(&self, message: &str, metadata: Option<Value>) {
        self.emit(LogLevel::Verbose, message, metadata, None);
    }

    /// Emit at [`LogLevel::Error`] with either a trace string or metadata.
    pub fn error(&self, message: &str, detail: impl Into<ErrorDetail>) {
        match detail.into() {
            ErrorDetail::None => self.emit(LogLevel::Error, message, None, None),
            ErrorDetail::Trace(trace) => self.emit(LogLevel::Error, message, None, Some(trace)),
            ErrorDetail::Metadata(metadata) => {
                self.emit(LogLevel::Error, message, Some(metadata), None);
            }
        }
    }

    /// Emit at [`LogLevel::Error`] with both a trace string and metadata.
    pub fn error_with_trace(&self, message: &str, trace: impl Into<String>, metadata: Option<Value>) {
        self.emit(LogLevel::Error, message, metadata, Some(trace.into()));
    }

    fn emit(&self, level: LogLevel, message: &str, metadata: Option<Value>, stack: Option<String>) {
        let fields = self.record(metadata, stack);
        self.sink.emit(&LogEntry {
            level,
            message: message.to_owned(),
            fields,
        });
    }

    fn record(&self, metadata: Option<Value>, stack: Option<String>) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(component) = &self.component {
            fields.insert("component".into(), Value::String(component.to_string()));
        }
        match metadata {
            Some(Value::Object(map)) => fields.extend(map),
            Some(Value::Null) | None => {}
            Some(other) => {
                fields.insert("metadata".into(), other);
            }
        }
        if let Some(stack) = stack {
            fields.insert("stack".into(), Value::String(stack));
        }
        RequestContext::with_current(|ctx| {
            fields.insert("requestId".into(), Value::String(ctx.request_id().to_string()));
            fields.insert(
                "correlationId".into(),
                Value::String(ctx.correlation_id().as_str().to_owned()),
            );
            if let Some(user_id) = ctx.user_id() {
                fields.insert("userId".into(), Value::String(user_id.to_string()));
            }
        });
        self.redaction.apply(&mut fields);
        fields
    }
}
