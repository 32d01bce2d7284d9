//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host platform implements.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the host.
//! Each trait represents a capability the core requires but that must be
//! implemented differently per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! - [`AudioPlayer`](playback::AudioPlayer) - The host audio engine: transport
//!   commands, position/duration readouts and a raw event stream
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert their native errors into it and keep the
//! message actionable. Decode and transport failures use
//! [`BridgeError::Decode`] so the core can tag them consistently.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync`: the engine calls them from its
//! ticker and event tasks as well as from the caller's task.

pub mod error;
pub mod logger;
pub mod playback;

pub use error::{BridgeError, Result};

pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{AudioPlayer, PlaybackEventStream, PlayerState, ProcessingState, RawPlaybackEvent};

#[cfg(any(test, feature = "mock"))]
pub use playback::MockAudioPlayer;
