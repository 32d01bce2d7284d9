//! # Playback Coordination Module
//!
//! Keeps a host audio engine, a navigable playlist and the UI in agreement.
//!
//! ## Overview
//!
//! This module handles:
//! - Track descriptors and their ingestion from backend payloads
//! - An ordered playlist with a clamped cursor
//! - Detecting when navigation changes the current track
//! - Mapping the engine's raw processing state to a normalized [`EngineState`]
//! - The [`PlaybackEngine`] coordinator: transport and playlist commands,
//!   a polling ticker, and four broadcast topics (engine snapshots, playlist
//!   navigation flags, playlist contents, current track)

pub mod config;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod playlist;
pub mod snapshot;
pub mod state;
pub mod track;

pub use config::EngineConfig;
pub use engine::{EngineDiagnostics, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use navigation::{CursorMove, Identified, NavigablePlaylist, TrackChange};
pub use playlist::Playlist;
pub use snapshot::{
    EngineSnapshot, PlaylistContents, PlaylistSnapshot, SnapshotUpdate, DECODE_ERROR_CODE,
    SOURCE_ERROR_CODE,
};
pub use state::{map_state, EngineState};
pub use track::{AudioEncoding, TrackId, TrackItem};
