//! # Playback Error Types
//!
//! Errors surfaced by construction, configuration and ingestion paths.
//! Transport and navigation commands never return these to callers; the
//! engine converts collaborator failures into an error snapshot instead.

use crate::snapshot::{DECODE_ERROR_CODE, SOURCE_ERROR_CODE};
use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur in the playback core.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Track has no URL for any accepted encoding.
    #[error("No playable source for track {0}")]
    NoPlayableSource(String),

    /// Backend payload could not be mapped to a track descriptor.
    #[error("Invalid track payload: {0}")]
    InvalidTrackPayload(#[from] serde_json::Error),

    /// Engine configuration failed validation.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The engine has been disposed.
    #[error("Playback engine disposed")]
    Disposed,

    /// Background tasks need a Tokio runtime.
    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),

    /// Failure reported by the host audio engine.
    #[error("Player error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::Bridge(BridgeError::OperationFailed(_))
                | PlaybackError::Bridge(BridgeError::NotAvailable(_))
        )
    }

    /// Short machine-readable tag carried by error snapshots.
    pub fn error_code(&self) -> &'static str {
        match self {
            PlaybackError::NoPlayableSource(_) => SOURCE_ERROR_CODE,
            _ => DECODE_ERROR_CODE,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
