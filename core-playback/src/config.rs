//! # Engine Configuration
//!
//! Tuning knobs for the playback coordinator.

use crate::error::{PlaybackError, Result};
use crate::track::AudioEncoding;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback engine configuration.
///
/// Controls the polling cadence, broadcast buffering and source selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How often the ticker re-reads position and duration from the player.
    ///
    /// Default: 250 ms.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: Duration,

    /// Per-topic broadcast buffer. Slow subscribers that fall further behind
    /// than this observe a lag and skip ahead.
    ///
    /// Default: 64.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Encodings to try, in order, when choosing a track URL.
    ///
    /// Default: compressed, then lossless.
    #[serde(default = "default_preferred_encodings")]
    pub preferred_encodings: Vec<AudioEncoding>,

    /// Start playback after `init_playlist_from*` loads the current track.
    ///
    /// Default: true.
    #[serde(default = "default_autoplay_on_init")]
    pub autoplay_on_init: bool,

    /// Whether new subscribers first receive the latest cached value.
    ///
    /// Default: true.
    #[serde(default = "default_replay_latest")]
    pub replay_latest: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            channel_capacity: default_channel_capacity(),
            preferred_encodings: default_preferred_encodings(),
            autoplay_on_init: default_autoplay_on_init(),
            replay_latest: default_replay_latest(),
        }
    }
}

impl EngineConfig {
    /// Faster polling for scrubbing-heavy UIs.
    pub fn responsive() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            ..Default::default()
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_preferred_encodings(mut self, encodings: Vec<AudioEncoding>) -> Self {
        self.preferred_encodings = encodings;
        self
    }

    pub fn with_autoplay_on_init(mut self, autoplay: bool) -> Self {
        self.autoplay_on_init = autoplay;
        self
    }

    pub fn with_replay_latest(mut self, replay: bool) -> Self {
        self.replay_latest = replay;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "tick_interval must be > 0".to_string(),
            ));
        }

        if self.channel_capacity == 0 {
            return Err(PlaybackError::InvalidConfig(
                "channel_capacity must be > 0".to_string(),
            ));
        }

        if self.preferred_encodings.is_empty() {
            return Err(PlaybackError::InvalidConfig(
                "preferred_encodings must name at least one encoding".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_tick_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_channel_capacity() -> usize {
    64
}

fn default_preferred_encodings() -> Vec<AudioEncoding> {
    vec![AudioEncoding::Compressed, AudioEncoding::Lossless]
}

fn default_autoplay_on_init() -> bool {
    true
}

fn default_replay_latest() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(
            config.preferred_encodings,
            vec![AudioEncoding::Compressed, AudioEncoding::Lossless]
        );
        assert!(config.autoplay_on_init);
        assert!(config.replay_latest);
    }

    #[test]
    fn test_responsive_config() {
        let config = EngineConfig::responsive();
        assert!(config.validate().is_ok());
        assert!(config.tick_interval < EngineConfig::default().tick_interval);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.tick_interval = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));
        config.tick_interval = Duration::from_millis(250);

        config.channel_capacity = 0;
        assert!(config.validate().is_err());
        config.channel_capacity = 64;

        config.preferred_encodings.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "channel_capacity": 8, "autoplay_on_init": false }"#)
                .unwrap();

        assert_eq!(config.channel_capacity, 8);
        assert!(!config.autoplay_on_init);
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert!(config.replay_latest);
    }
}
