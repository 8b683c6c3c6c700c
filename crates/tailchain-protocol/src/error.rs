use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid hash: {0}")]
    InvalidHash(#[from] tailchain_types::TypeError),

    #[error("missing header {0}")]
    MissingHeader(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid instant {0:?}: expected <unix-seconds>:<nanoseconds>")]
    InvalidInstant(String),

    #[error("content length mismatch: declared {declared}, received {actual}")]
    LengthMismatch { declared: u64, actual: usize },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
