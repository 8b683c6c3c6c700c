use tailchain_ledger::LedgerError;
use tailchain_protocol::ProtocolError;
use tailchain_types::ChainHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("replication cancelled")]
    Cancelled,

    #[error("invalid remote target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("remote answered {status} for {url}")]
    RemoteStatus { status: u16, url: String },

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed envelope: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("content hash mismatch at height {height}")]
    ContentMismatch { height: u64 },

    #[error("remote declared height {declared}, expected {expected}")]
    HeightMismatch { expected: u64, declared: u64 },

    #[error("remote declared {declared} but entry hashes to {derived}")]
    HashMismatch {
        declared: ChainHash,
        derived: ChainHash,
    },

    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for SyncError {
    fn from(err: LedgerError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Ledger(err)
        }
    }
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
