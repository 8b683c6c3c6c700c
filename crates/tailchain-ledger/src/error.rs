use tailchain_crypto::SignatureError;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no entry with the given hash")]
    EntryNotFound,

    #[error("incorrect timestamp: entry is earlier than the current tip")]
    IncorrectTimestamp,

    #[error("ledger needs a signer to append unsigned content")]
    MissingSigner,

    #[error("ledger needs a verifier to append pre-signed content")]
    MissingVerifier,

    #[error("ledger needs at least a signer or a verifier")]
    MissingCapabilities,

    #[error("crypto verification failed")]
    VerificationFailed,

    #[error(transparent)]
    Signing(#[from] SignatureError),

    #[error("hash collision detected")]
    HashCollision,

    #[error("integrity violation at height {height}: {reason}")]
    IntegrityViolation { height: u64, reason: String },

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("wait cancelled")]
    Cancelled,
}

impl LedgerError {
    /// Returns `true` when the caller abandoned a wait, as opposed to the
    /// ledger rejecting something.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
