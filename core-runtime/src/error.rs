//! Errors raised while assembling the runtime.

use thiserror::Error;

/// Startup failures. Nothing in this crate fails once the core is running.
#[derive(Error, Debug)]
pub enum Error {
    /// Logging setup or another configuration value was rejected.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host bridge was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_message_names_bridge() {
        let err = Error::CapabilityMissing {
            capability: "AudioPlayer".into(),
            message: "inject one".into(),
        };
        assert_eq!(err.to_string(), "Capability missing: AudioPlayer - inject one");
    }
}
