//! Normalized engine state and the mapping from raw player state.

use bridge_traits::ProcessingState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback state as presented to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Idle,
    Loading,
    Buffering,
    Playing,
    Paused,
    Ended,
    Error,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Buffering => "buffering",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Translate the player's raw processing state and playing flag.
///
/// Buffering wins over the playing flag. Unknown raw states map to
/// [`EngineState::Error`].
pub fn map_state(processing_state: &ProcessingState, playing: bool) -> EngineState {
    match processing_state {
        ProcessingState::Loading | ProcessingState::Buffering => EngineState::Buffering,
        ProcessingState::Idle => EngineState::Idle,
        ProcessingState::Ready if playing => EngineState::Playing,
        ProcessingState::Ready => EngineState::Paused,
        ProcessingState::Completed => EngineState::Ended,
        ProcessingState::Unrecognized(_) => EngineState::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_table() {
        let cases = [
            (ProcessingState::Idle, false, EngineState::Idle),
            (ProcessingState::Idle, true, EngineState::Idle),
            (ProcessingState::Loading, false, EngineState::Buffering),
            (ProcessingState::Loading, true, EngineState::Buffering),
            (ProcessingState::Buffering, false, EngineState::Buffering),
            (ProcessingState::Buffering, true, EngineState::Buffering),
            (ProcessingState::Ready, false, EngineState::Paused),
            (ProcessingState::Ready, true, EngineState::Playing),
            (ProcessingState::Completed, false, EngineState::Ended),
            (ProcessingState::Completed, true, EngineState::Ended),
        ];

        for (raw, playing, expected) in cases {
            assert_eq!(
                map_state(&raw, playing),
                expected,
                "{raw} / playing={playing}"
            );
        }
    }

    #[test]
    fn unrecognized_maps_to_error() {
        let raw = ProcessingState::Unrecognized("stalled".to_string());
        assert_eq!(map_state(&raw, true), EngineState::Error);
        assert_eq!(map_state(&raw, false), EngineState::Error);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EngineState::Buffering).unwrap(),
            "\"buffering\""
        );
        assert_eq!(EngineState::Ended.to_string(), "ended");
    }
}
