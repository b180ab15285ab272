//! Test utilities for the backend crate.
//!
//! These helpers are shared between unit tests in `src/` and integration
//! tests in `tests/`. They are compiled for tests and behind the
//! `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::logging::{LogEntry, LogLevel, LogSink, Logger, RedactionPolicy};

/// Sink that keeps every record in memory.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use switchboard::logging::{Logger, RedactionPolicy};
/// use switchboard::test_support::MemorySink;
///
/// let sink = Arc::new(MemorySink::default());
/// Logger::new(sink.clone(), RedactionPolicy::default()).warn("disk low", None);
/// assert_eq!(sink.messages(), vec!["disk low".to_owned()]);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the captured records in emission order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Captured messages in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|entry| entry.message.clone()).collect()
    }

    /// First record with `message`, if any.
    pub fn find(&self, message: &str) -> Option<LogEntry> {
        self.lock().iter().find(|entry| entry.message == message).cloned()
    }

    /// Records emitted at `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: &LogEntry) {
        self.lock().push(entry.clone());
    }
}

/// Logger with default redaction writing to a fresh [`MemorySink`].
pub fn memory_logger() -> (Logger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let logger = Logger::new(sink.clone(), RedactionPolicy::default());
    (logger, sink)
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixtureClock(pub DateTime<Utc>);

impl FixtureClock {
    /// Clock frozen at 2024-01-01T00:00:00Z.
    pub fn epoch() -> Self {
        Self(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
