use tailchain_types::ChainHash;

use crate::signer::SignatureError;

/// Produces a signature over an entry hash.
///
/// Supplied once when a ledger is built and never swapped afterwards.
pub trait EntrySigner: Send + Sync {
    fn sign(&self, hash: &ChainHash) -> Result<Vec<u8>, SignatureError>;
}

/// Checks a signature over an entry hash.
pub trait EntryVerifier: Send + Sync {
    fn verify(&self, hash: &ChainHash, signature: &[u8]) -> bool;
}
