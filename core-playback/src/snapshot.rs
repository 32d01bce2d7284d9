//! # Snapshots
//!
//! Immutable values pushed to subscribers.
//!
//! An [`EngineSnapshot`] is never patched in place: the engine builds the
//! next one with [`EngineSnapshot::merge`], which keeps every field the
//! update leaves unset. Subscribers therefore always receive a complete view
//! taken at a single instant.

use crate::playlist::Playlist;
use crate::state::EngineState;
use crate::track::TrackItem;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error code for failures reported by the player (decode or transport).
pub const DECODE_ERROR_CODE: &str = "decode";

/// Error code for tracks without a URL in any accepted encoding.
pub const SOURCE_ERROR_CODE: &str = "source";

/// Point-in-time playback state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub position: Duration,
    /// Zero while unknown.
    pub duration: Duration,
    pub error_code: Option<String>,
}

impl EngineSnapshot {
    /// Apply `update`, keeping every field it does not set.
    pub fn merge(&self, update: SnapshotUpdate) -> Self {
        Self {
            state: update.state.unwrap_or(self.state),
            position: update.position.unwrap_or(self.position),
            duration: update.duration.unwrap_or(self.duration),
            error_code: match update.error_code {
                Some(code) => code,
                None => self.error_code.clone(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.state == EngineState::Error
    }
}

/// Partial update for [`EngineSnapshot::merge`].
///
/// `error_code` is doubly optional: `None` keeps the current code,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotUpdate {
    pub state: Option<EngineState>,
    pub position: Option<Duration>,
    pub duration: Option<Duration>,
    pub error_code: Option<Option<String>>,
}

impl SnapshotUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: EngineState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn position(mut self, position: Duration) -> Self {
        self.position = Some(position);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(Some(code.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error_code = Some(None);
        self
    }

    /// Error state carrying `code`.
    pub fn failure(code: impl Into<String>) -> Self {
        Self::new().state(EngineState::Error).error_code(code)
    }
}

/// Navigation flags derived from the playlist at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnapshot {
    pub is_empty: bool,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PlaylistSnapshot {
    pub fn of<T>(playlist: &Playlist<T>) -> Self {
        Self {
            is_empty: playlist.is_empty(),
            has_next: playlist.has_next(),
            has_prev: playlist.has_prev(),
        }
    }
}

impl Default for PlaylistSnapshot {
    fn default() -> Self {
        Self {
            is_empty: true,
            has_next: false,
            has_prev: false,
        }
    }
}

/// Full playlist contents plus cursor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaylistContents {
    pub items: Vec<TrackItem>,
    pub index: usize,
}

impl PlaylistContents {
    pub fn of(playlist: &Playlist<TrackItem>) -> Self {
        Self {
            items: playlist.to_vec(),
            index: playlist.index(),
        }
    }

    pub fn current(&self) -> Option<&TrackItem> {
        self.items.get(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_at(secs: u64) -> EngineSnapshot {
        EngineSnapshot {
            state: EngineState::Playing,
            position: Duration::from_secs(secs),
            duration: Duration::from_secs(200),
            error_code: None,
        }
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let next = playing_at(5).merge(SnapshotUpdate::new().position(Duration::from_secs(6)));

        assert_eq!(next.state, EngineState::Playing);
        assert_eq!(next.position, Duration::from_secs(6));
        assert_eq!(next.duration, Duration::from_secs(200));
    }

    #[test]
    fn merge_error_code_set_keep_clear() {
        let failed = playing_at(5).merge(SnapshotUpdate::failure(DECODE_ERROR_CODE));
        assert!(failed.is_error());
        assert_eq!(failed.error_code.as_deref(), Some("decode"));

        let kept = failed.merge(SnapshotUpdate::new().position(Duration::ZERO));
        assert_eq!(kept.error_code.as_deref(), Some("decode"));

        let cleared = kept.merge(SnapshotUpdate::new().state(EngineState::Idle).clear_error());
        assert_eq!(cleared.error_code, None);
        assert_eq!(cleared.state, EngineState::Idle);
    }

    #[test]
    fn playlist_snapshot_of_empty() {
        let playlist: Playlist<u8> = Playlist::new();
        assert_eq!(PlaylistSnapshot::of(&playlist), PlaylistSnapshot::default());
    }

    #[test]
    fn playlist_snapshot_in_middle() {
        let mut playlist = Playlist::new();
        playlist.init_from_list_at([1, 2, 3], 1);
        assert_eq!(
            PlaylistSnapshot::of(&playlist),
            PlaylistSnapshot {
                is_empty: false,
                has_next: true,
                has_prev: true,
            }
        );
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(PlaylistSnapshot::default()).unwrap();
        assert_eq!(json["isEmpty"], true);
        assert_eq!(json["hasPrev"], false);
    }
}
