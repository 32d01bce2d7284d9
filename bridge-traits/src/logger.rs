//! Host log forwarding.
//!
//! The core logs through `tracing`. When the host hands over a
//! [`LoggerSink`], every event that survives filtering is also delivered to
//! it as a [`LogEntry`], so playback diagnostics end up next to the host's
//! own logs (OSLog, Logcat, browser console, files).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// One forwarded log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Module that emitted the event, e.g. `core_playback::engine`.
    pub target: String,
    pub message: String,
    /// Structured fields, already redacted. Sorted by key.
    pub fields: BTreeMap<String, String>,
    /// Innermost span, usually the engine command being executed.
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: BTreeMap::new(),
            span: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>5} {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level.as_filter_str().to_uppercase(),
            self.target
        )?;
        if let Some(span) = &self.span {
            write!(f, "::{span}")?;
        }
        write!(f, ": {}", self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Receives log entries from the core.
///
/// Called from whichever task emitted the event, so implementations should
/// hand entries off quickly.
///
/// ```ignore
/// struct OsLogSink;
///
/// #[async_trait::async_trait]
/// impl LoggerSink for OsLogSink {
///     async fn log(&self, entry: LogEntry) -> Result<()> {
///         os_log(entry.level, &entry.to_string());
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Entries below this level are never delivered.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Writes entries to stderr, one line each.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

#[async_trait::async_trait]
impl LoggerSink for ConsoleLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level >= self.min_level {
            eprintln!("{entry}");
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "core_playback", "Track loaded")
            .with_field("track", "t-1")
            .with_span("next_track");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.fields.get("track").map(String::as_str), Some("t-1"));
        assert_eq!(entry.span.as_deref(), Some("next_track"));
    }

    #[test]
    fn test_entry_display_is_single_line() {
        let entry = LogEntry::new(LogLevel::Warn, "core_playback::engine", "Fallback")
            .with_field("selected", "d")
            .with_field("count", "3")
            .with_span("init_playlist_from_with_track");

        let line = entry.to_string();
        assert!(!line.contains('\n'));
        assert!(line.contains(" WARN core_playback::engine::init_playlist_from_with_track"));
        assert!(line.ends_with("Fallback count=3 selected=d"));
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Warn > LogLevel::Info);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }

    #[tokio::test]
    async fn test_console_logger() {
        let logger = ConsoleLogger {
            min_level: LogLevel::Warn,
        };
        logger
            .log(LogEntry::new(LogLevel::Info, "test", "filtered"))
            .await
            .unwrap();
        assert_eq!(logger.min_level(), LogLevel::Warn);
    }
}
