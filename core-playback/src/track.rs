//! # Track Descriptors
//!
//! Immutable descriptions of playable tracks, plus the mapping from backend
//! payloads.

use crate::error::Result;
use crate::navigation::Identified;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable track identifier issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Media encodings a track may be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// FLAC/WAV master.
    Lossless,
    /// MP3/AAC stream.
    Compressed,
}

/// Descriptor of a playable track.
///
/// Identity is the [`TrackId`]: two items with the same id compare equal
/// regardless of their other fields. Optional metadata stays `None` when the
/// backend omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackItem {
    #[serde(rename = "trackId")]
    pub id: TrackId,
    pub name: String,
    pub album_id: Option<String>,
    pub artist_id: Option<String>,
    /// Tempo in beats per minute.
    pub bpm: Option<f32>,
    pub genre: Option<String>,
    #[serde(default)]
    pub urls: BTreeMap<AudioEncoding, String>,
    /// Pre-computed waveform data for the seek bar.
    pub waveform_url: Option<String>,
}

impl TrackItem {
    pub fn new(id: impl Into<TrackId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            album_id: None,
            artist_id: None,
            bpm: None,
            genre: None,
            urls: BTreeMap::new(),
            waveform_url: None,
        }
    }

    /// Map a backend payload to a descriptor.
    ///
    /// Recognized keys: `trackId`, `name`, `albumId`, `artistId`, `bpm`,
    /// `genre`, `urls` (`lossless`/`compressed`), `waveformUrl`. Unknown keys
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidTrackPayload`](crate::PlaybackError::InvalidTrackPayload)
    /// when `trackId` or `name` is missing or a field has the wrong type.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(payload)?)
    }

    pub fn with_url(mut self, encoding: AudioEncoding, url: impl Into<String>) -> Self {
        self.urls.insert(encoding, url.into());
        self
    }

    pub fn with_album_id(mut self, album_id: impl Into<String>) -> Self {
        self.album_id = Some(album_id.into());
        self
    }

    pub fn with_artist_id(mut self, artist_id: impl Into<String>) -> Self {
        self.artist_id = Some(artist_id.into());
        self
    }

    pub fn with_bpm(mut self, bpm: f32) -> Self {
        self.bpm = Some(bpm);
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_waveform_url(mut self, url: impl Into<String>) -> Self {
        self.waveform_url = Some(url.into());
        self
    }

    pub fn url(&self, encoding: AudioEncoding) -> Option<&str> {
        self.urls.get(&encoding).map(String::as_str)
    }

    /// First URL available in `preference` order.
    pub fn preferred_url(&self, preference: &[AudioEncoding]) -> Option<&str> {
        preference.iter().find_map(|encoding| self.url(*encoding))
    }
}

impl PartialEq for TrackItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrackItem {}

impl Hash for TrackItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Identified for TrackItem {
    type Id = TrackId;

    fn id(&self) -> &TrackId {
        &self.id
    }
}
