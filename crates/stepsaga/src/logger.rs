use std::sync::{Arc, Mutex, PoisonError};

/// Sink for orchestration trace lines.
///
/// Logging is fire-and-forget: implementations must not fail the saga.
pub trait Logger: Send + Sync {
    /// Record an informational line.
    fn info(&self, message: &str);

    /// Record an error line.
    fn error(&self, message: &str);
}

/// Severity of a recorded log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// Logger that forwards to `tracing`.
///
/// Every event carries a `logger` field of the form
/// `"<service> - <saga>"` and an `environment` field.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
    environment: String,
}

impl TracingLogger {
    #[must_use]
    pub fn new(service: &str, environment: &str, saga: &str) -> Self {
        Self {
            name: format!("{service} - {saga}"),
            environment: environment.to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(logger = %self.name, environment = %self.environment, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(logger = %self.name, environment = %self.environment, "{message}");
    }
}

/// Logger that keeps every line in memory.
///
/// Clones share the same buffer, so a clone can be handed to a saga while the
/// original is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl RecordingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded messages of one severity, oldest first.
    #[must_use]
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    /// Whether any recorded message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
