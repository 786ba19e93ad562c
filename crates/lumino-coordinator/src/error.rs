use lumino_types::LuminoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Errors surfaced by the coordinator and its actor handle
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Protocol(#[from] LuminoError),

    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Coordinator is no longer running")]
    ChannelClosed,
}

impl CoordinatorError {
    /// The protocol error behind this failure, if any
    pub fn protocol(&self) -> Option<&LuminoError> {
        match self {
            CoordinatorError::Protocol(err) => Some(err),
            _ => None,
        }
    }

    /// See [`LuminoError::is_benign`]
    pub fn is_benign(&self) -> bool {
        self.protocol().map(LuminoError::is_benign).unwrap_or(false)
    }
}
