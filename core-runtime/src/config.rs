//! # Core Configuration Module
//!
//! Provides runtime configuration for the playback core.
//!
//! ## Overview
//!
//! A builder constructs a [`CoreConfig`] holding the host bridges the core
//! needs. Validation is fail-fast: a missing required bridge is reported at
//! build time with an actionable message instead of surfacing later as a
//! silent no-op.
//!
//! ## Required Dependencies
//!
//! - `AudioPlayer` - the host audio engine the core drives
//!
//! ## Optional Dependencies
//!
//! - `LoggerSink` - mirror core logs into the host logging pipeline
//! - `LoggingConfig` - when present, the service installs the global
//!   `tracing` subscriber during bootstrap
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .player(Arc::new(MyNativePlayer::new()))
//!     .logger_sink(Arc::new(MyOsLogSink))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Fails: no AudioPlayer was provided.
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{AudioPlayer, LoggerSink};
use std::sync::Arc;

/// Runtime configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Host audio engine (required)
    pub player: Arc<dyn AudioPlayer>,

    /// Logging setup applied at bootstrap. `None` leaves any subscriber the
    /// host already installed untouched.
    pub logging: Option<LoggingConfig>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("player", &"AudioPlayer { ... }")
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

fn player_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioPlayer".to_string(),
        message: "No audio player provided. \
                  Inject the host's native playback engine via CoreConfigBuilder::player()."
            .to_string(),
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    player: Option<Arc<dyn AudioPlayer>>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Set the host audio engine.
    pub fn player(mut self, player: Arc<dyn AudioPlayer>) -> Self {
        self.player = Some(player);
        self
    }

    /// Install `tracing` with this configuration during bootstrap.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Mirror logs into a host sink. Enables logging with defaults if no
    /// [`LoggingConfig`] was set.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        let logging = self.logging.take().unwrap_or_default();
        self.logging = Some(logging.with_logger_sink(sink));
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when no player was provided.
    pub fn build(self) -> Result<CoreConfig> {
        let player = self.player.ok_or_else(player_missing_error)?;

        Ok(CoreConfig {
            player,
            logging: self.logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{ConsoleLogger, LogLevel, MockAudioPlayer};

    #[test]
    fn test_builder_requires_player() {
        let err = CoreConfig::builder().build().unwrap_err();
        match err {
            Error::CapabilityMissing { capability, message } => {
                assert_eq!(capability, "AudioPlayer");
                assert!(message.contains("CoreConfigBuilder::player"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builder_with_player_only() {
        let config = CoreConfig::builder()
            .player(Arc::new(MockAudioPlayer::new()))
            .build()
            .unwrap();

        assert!(config.logging.is_none());
    }

    #[test]
    fn test_logger_sink_enables_default_logging() {
        let config = CoreConfig::builder()
            .player(Arc::new(MockAudioPlayer::new()))
            .logger_sink(Arc::new(ConsoleLogger::default()))
            .build()
            .unwrap();

        let logging = config.logging.expect("logging enabled");
        assert!(logging.logger_sink.is_some());
        assert_eq!(logging.level, LogLevel::Info);
    }

    #[test]
    fn test_logger_sink_keeps_explicit_logging_config() {
        let config = CoreConfig::builder()
            .player(Arc::new(MockAudioPlayer::new()))
            .logging(LoggingConfig::default().with_level(LogLevel::Debug))
            .logger_sink(Arc::new(ConsoleLogger::default()))
            .build()
            .unwrap();

        let logging = config.logging.unwrap();
        assert_eq!(logging.level, LogLevel::Debug);
        assert!(logging.logger_sink.is_some());
    }

    #[test]
    fn test_debug_hides_bridge_internals() {
        let config = CoreConfig::builder()
            .player(Arc::new(MockAudioPlayer::new()))
            .build()
            .unwrap();
        assert!(format!("{:?}", config).contains("AudioPlayer { ... }"));
    }
}
