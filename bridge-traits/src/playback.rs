//! Playback bridge traits and supporting player types.
//!
//! The core never decodes or transports audio itself. Host applications hand
//! it an [`AudioPlayer`] that wraps their native engine (desktop, mobile, web)
//! and the core drives it through the async-first surface below. The player
//! reports what it is doing through two channels: a pollable
//! [`PlayerState`] plus position/duration readouts, and a push stream of
//! [`RawPlaybackEvent`]s that may terminate in an error.

use crate::{error::Result, BridgeError};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Processing state as reported by the host engine.
///
/// Hosts that surface a value outside the known set should map it to
/// [`ProcessingState::Unrecognized`] rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    /// No source loaded, or the player was stopped.
    Idle,
    /// A source is being opened.
    Loading,
    /// Waiting for enough media to continue.
    Buffering,
    /// Media is ready; playback proceeds if the playing flag is set.
    Ready,
    /// The end of the source was reached.
    Completed,
    /// Engine-specific value with no portable meaning.
    Unrecognized(String),
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingState::Idle => f.write_str("idle"),
            ProcessingState::Loading => f.write_str("loading"),
            ProcessingState::Buffering => f.write_str("buffering"),
            ProcessingState::Ready => f.write_str("ready"),
            ProcessingState::Completed => f.write_str("completed"),
            ProcessingState::Unrecognized(raw) => write!(f, "unrecognized({raw})"),
        }
    }
}

/// Point-in-time combination of processing state and the playing flag.
///
/// The playing flag reflects *intent*: it is `true` from the moment `play()`
/// is issued, even while the engine is still buffering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub processing_state: ProcessingState,
    pub playing: bool,
}

impl PlayerState {
    pub fn new(processing_state: ProcessingState, playing: bool) -> Self {
        Self {
            processing_state,
            playing,
        }
    }

    /// State of a freshly constructed or stopped player.
    pub fn idle() -> Self {
        Self::new(ProcessingState::Idle, false)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Raw event pushed by the host engine whenever something changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPlaybackEvent {
    pub processing_state: ProcessingState,
    /// Position at the time the event was produced.
    pub position: Duration,
    /// How far ahead the engine has buffered.
    pub buffered_position: Duration,
    /// Total length of the loaded source, if the engine knows it.
    pub duration: Option<Duration>,
}

impl RawPlaybackEvent {
    pub fn new(processing_state: ProcessingState, position: Duration) -> Self {
        Self {
            processing_state,
            position,
            buffered_position: position,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_buffered_position(mut self, buffered: Duration) -> Self {
        self.buffered_position = buffered;
        self
    }
}

/// Stream of raw engine events. An `Err` item signals a decode or transport
/// failure; the stream may keep producing items afterwards.
pub type PlaybackEventStream = BoxStream<'static, std::result::Result<RawPlaybackEvent, BridgeError>>;

/// Host audio engine driven by the playback core.
///
/// Implementations are shared between the caller's task, the ticker and the
/// event listener.
///
/// ## Semantics
///
/// - `play()` only *issues* the command. Audible playback starts
///   asynchronously and the engine reports progress through
///   [`AudioPlayer::player_state`] and the event stream.
/// - Awaitable commands resolve once the engine has applied them.
/// - The engine has "last call wins" semantics for `set_source`: a newer
///   source replaces an in-flight one.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Start or resume playback of the loaded source.
    fn play(&self) -> Result<()>;

    /// Pause playback, keeping the current position.
    async fn pause(&self) -> Result<()>;

    /// Stop playback and return the engine to its idle state.
    async fn stop(&self) -> Result<()>;

    /// Seek within the loaded source. Range checking is the engine's concern.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Replace the loaded source with `uri`. Returns the duration when the
    /// engine can determine it while opening the source.
    async fn set_source(&self, uri: &str) -> Result<Option<Duration>>;

    /// Prime the current source without starting playback.
    async fn load(&self) -> Result<()>;

    /// Current playback position.
    fn position(&self) -> Duration;

    /// Length of the loaded source, when known.
    fn duration(&self) -> Option<Duration>;

    /// Current processing state and playing flag.
    fn player_state(&self) -> PlayerState;

    /// Subscribe to the engine's raw event stream.
    fn playback_events(&self) -> PlaybackEventStream;

    /// Release native resources. The player must not be used afterwards.
    async fn dispose(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn player_state_defaults_to_idle() {
        let state = PlayerState::default();
        assert_eq!(state.processing_state, ProcessingState::Idle);
        assert!(!state.playing);
    }

    #[test]
    fn processing_state_display() {
        assert_eq!(ProcessingState::Buffering.to_string(), "buffering");
        assert_eq!(
            ProcessingState::Unrecognized("stalled".into()).to_string(),
            "unrecognized(stalled)"
        );
    }

    #[test]
    fn raw_event_builder() {
        let event = RawPlaybackEvent::new(ProcessingState::Ready, Duration::from_secs(3))
            .with_duration(Some(Duration::from_secs(180)))
            .with_buffered_position(Duration::from_secs(10));

        assert_eq!(event.position, Duration::from_secs(3));
        assert_eq!(event.buffered_position, Duration::from_secs(10));
        assert_eq!(event.duration, Some(Duration::from_secs(180)));
    }

    #[tokio::test]
    async fn mock_player_reports_configured_state() {
        let mut player = MockAudioPlayer::new();
        player
            .expect_player_state()
            .returning(|| PlayerState::new(ProcessingState::Ready, true));
        player
            .expect_playback_events()
            .returning(|| futures::stream::empty().boxed());

        assert!(player.player_state().playing);
        assert!(player.playback_events().next().await.is_none());
    }
}
