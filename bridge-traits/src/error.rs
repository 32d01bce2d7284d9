use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The host engine could not decode or transport the loaded media.
    #[error("Decode failure: {0}")]
    Decode(String),

    /// The host player has already been released.
    #[error("Player released")]
    Released,
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::OperationFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
