//! # Logging
//!
//! `tracing` setup for the playback core.
//!
//! [`init_logging`] installs one global subscriber made of three layers:
//!
//! ```text
//! registry
//!   ├─ EnvFilter          workspace crates at the configured level, others at warn
//!   ├─ HostSinkLayer      mirrors events into the host's LoggerSink (optional)
//!   └─ fmt layer          pretty / json / compact on stdout
//! ```
//!
//! Media URLs handed to the player are often pre-signed, so any field whose
//! name mentions `url` or `uri` loses its query string before it reaches the
//! host sink, and credential-like fields are masked. Call sites in the core
//! apply [`redact_url_query`] themselves as well, which keeps the stdout
//! output clean.
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_logger_sink(Arc::new(ConsoleLogger::default())),
//! )?;
//! ```

use crate::error::{Error, Result};

use bridge_traits::logger::{LogEntry, LogLevel, LoggerSink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{
    filter::EnvFilter,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Crates whose output follows the configured level.
const WORKSPACE_TARGETS: &[&str] = &["core_runtime", "core_playback", "core_service"];

const REDACTED: &str = "[REDACTED]";

/// Output format of the stdout layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    /// One JSON object per event.
    Json,
    /// One short line per event.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Logging configuration.
#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied to the workspace crates.
    pub level: LogLevel,
    /// Full `EnvFilter` directive string; replaces the per-crate default.
    pub filter: Option<String>,
    /// Host sink receiving a copy of every event.
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Log span activity (pretty) or span context (json).
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("has_logger_sink", &self.logger_sink.is_some())
            .field("enable_spans", &self.enable_spans)
            .finish_non_exhaustive()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let directives = match &self.filter {
            Some(filter) => filter.clone(),
            None => default_filter(self.level),
        };
        EnvFilter::try_new(&directives)
            .map_err(|e| Error::Config(format!("Invalid log filter `{}`: {}", directives, e)))
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns [`Error::Config`] when the filter does not parse or a global
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(config.logger_sink.clone().map(HostSinkLayer::new))
        .with(stdout_layer(&config))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn stdout_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Pretty => {
            let spans = if config.enable_spans {
                FmtSpan::ACTIVE
            } else {
                FmtSpan::NONE
            };
            layer.pretty().with_span_events(spans).boxed()
        }
        LogFormat::Json => layer
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn default_filter(level: LogLevel) -> String {
    std::iter::once("warn".to_string())
        .chain(
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, level)),
        )
        .collect::<Vec<_>>()
        .join(",")
}

/// Mirrors events into a [`LoggerSink`].
struct HostSinkLayer {
    sink: Arc<dyn LoggerSink>,
}

impl HostSinkLayer {
    fn new(sink: Arc<dyn LoggerSink>) -> Self {
        Self { sink }
    }

    fn deliver(&self, entry: LogEntry) {
        let sink = Arc::clone(&self.sink);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(err) = sink.log(entry).await {
                        eprintln!("LoggerSink error: {}", err);
                    }
                });
            }
            Err(_) => {
                if let Err(err) = futures::executor::block_on(sink.log(entry)) {
                    eprintln!("LoggerSink error: {}", err);
                }
            }
        }
    }
}

impl<S> Layer<S> for HostSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = to_log_level(*metadata.level());
        if level < self.sink.min_level() {
            return;
        }

        let mut fields = EntryFields::default();
        event.record(&mut fields);

        let message = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);
        entry.fields = fields.values;
        entry.span = ctx.lookup_current().map(|span| span.name().to_string());

        self.deliver(entry);
    }
}

#[derive(Default)]
struct EntryFields {
    message: Option<String>,
    values: BTreeMap<String, String>,
}

impl EntryFields {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            let value = scrub(field.name(), &value);
            self.values.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for EntryFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }
}

fn scrub(field: &str, value: &str) -> String {
    let name = field.to_ascii_lowercase();
    if name.contains("url") || name.contains("uri") {
        redact_url_query(value).to_string()
    } else {
        redact_if_sensitive(field, value)
    }
}

fn to_log_level(level: tracing::Level) -> LogLevel {
    match level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        _ => LogLevel::Error,
    }
}

/// Mask credential fields and the local part of e-mail addresses.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("api_key", "k-123"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("owner", "ana@example.com"), "a***@example.com");
/// assert_eq!(redact_if_sensitive("track_id", "t-9"), "t-9");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "cookie",
        "signature",
    ];

    let name = field_name.to_ascii_lowercase();
    if SENSITIVE.iter().any(|marker| name.contains(marker)) {
        return REDACTED.to_string();
    }

    match value.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !value.contains("://") =>
        {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        _ => value.to_string(),
    }
}

/// Drop the query string and fragment from a media URL.
///
/// ```
/// use core_runtime::logging::redact_url_query;
///
/// assert_eq!(
///     redact_url_query("https://cdn.example.com/a.mp3?X-Amz-Signature=abc"),
///     "https://cdn.example.com/a.mp3"
/// );
/// ```
pub fn redact_url_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Keep only the last path component of a local file path.
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as SinkResult;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LoggerSink for CapturingSink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    fn capture<F: FnOnce()>(emit: F) -> Vec<LogEntry> {
        let sink = Arc::new(CapturingSink::default());
        let layer = HostSinkLayer::new(sink.clone());
        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), emit);
        let entries = sink.entries.lock().clone();
        entries
    }

    #[test]
    fn test_default_filter_covers_workspace_crates() {
        assert_eq!(
            default_filter(LogLevel::Debug),
            "warn,core_runtime=debug,core_playback=debug,core_service=debug"
        );
        assert!(LoggingConfig::default().env_filter().is_ok());
    }

    #[test]
    fn test_custom_filter_replaces_default() {
        let config = LoggingConfig::default().with_filter("core_playback=trace");
        let filter = config.env_filter().unwrap().to_string();
        assert!(filter.contains("core_playback=trace"));
        assert!(!filter.contains("core_service"));
    }

    #[test]
    fn test_sink_receives_event_with_fields() {
        let entries = capture(|| {
            tracing::warn!(target: "core_playback", selected = "d", "Selected track not in playlist");
        });

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.target, "core_playback");
        assert_eq!(entry.message, "Selected track not in playlist");
        assert_eq!(entry.fields.get("selected").map(String::as_str), Some("d"));
    }

    #[test]
    fn test_sink_respects_min_level() {
        let entries = capture(|| {
            tracing::trace!("too chatty");
            tracing::debug!("kept");
        });
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn test_sink_scrubs_urls_and_credentials() {
        let entries = capture(|| {
            tracing::info!(
                url = "https://cdn.example.com/t/1.flac?sig=abc",
                auth_token = "xyz",
                "Loading track"
            );
        });

        let fields = &entries[0].fields;
        assert_eq!(fields["url"], "https://cdn.example.com/t/1.flac");
        assert_eq!(fields["auth_token"], REDACTED);
    }

    #[test]
    fn test_sink_records_current_span() {
        let entries = capture(|| {
            let span = tracing::info_span!("next_track");
            let _entered = span.enter();
            tracing::info!("moved");
        });
        assert_eq!(entries[0].span.as_deref(), Some("next_track"));
    }

    #[test]
    fn test_redact_url_query_fragment() {
        assert_eq!(
            redact_url_query("https://cdn.example.com/t/1.mp3#t=30"),
            "https://cdn.example.com/t/1.mp3"
        );
        assert_eq!(redact_url_query("file:///music/a.wav"), "file:///music/a.wav");
    }

    #[test]
    fn test_redact_keeps_urls_with_user_info() {
        assert_eq!(
            redact_if_sensitive("source", "https://user@cdn.example.com/a.mp3"),
            "https://user@cdn.example.com/a.mp3"
        );
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
        assert_eq!(strip_path("C:\\Users\\me\\Music\\song.mp3"), "song.mp3");
        assert_eq!(strip_path("song.mp3"), "song.mp3");
    }
}
