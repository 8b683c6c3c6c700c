use std::collections::HashSet;
use std::sync::Arc;

use tailchain_crypto::{ContentHasher, EntryVerifier};

use crate::entry::Entry;
use crate::error::{LedgerError, LedgerResult};

/// Full-chain integrity audit.
///
/// Checks, for every entry in order:
/// 1. height equals position
/// 2. genesis has no previous hash; every other entry links to its predecessor
/// 3. instants never go backwards
/// 4. content hash matches the stored content
/// 5. cached identity matches the recomputed header hash, and is unique
/// 6. signature verifies, when a verifier is supplied
pub struct ChainValidator<'a> {
    verifier: Option<&'a dyn EntryVerifier>,
}

impl<'a> ChainValidator<'a> {
    /// Structural checks only; signatures are not inspected.
    pub fn new() -> Self {
        Self { verifier: None }
    }

    pub fn with_verifier(verifier: &'a dyn EntryVerifier) -> Self {
        Self {
            verifier: Some(verifier),
        }
    }

    pub fn validate(&self, entries: &[Arc<Entry>]) -> LedgerResult<()> {
        let mut seen = HashSet::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let height = entry.height();
            let violation = |reason: &str| LedgerError::IntegrityViolation {
                height,
                reason: reason.into(),
            };

            if height != index as u64 {
                return Err(LedgerError::IntegrityViolation {
                    height,
                    reason: format!("expected height {index}"),
                });
            }

            match (index, entry.prev_hash()) {
                (0, None) => {}
                (0, Some(_)) => return Err(violation("genesis entry has a previous hash")),
                (_, None) => return Err(violation("missing previous hash")),
                (_, Some(prev)) => {
                    let previous = &entries[index - 1];
                    if *prev != previous.hash() {
                        return Err(violation("previous hash link mismatch"));
                    }
                    if entry.instant() < previous.instant() {
                        return Err(violation("timestamp earlier than predecessor"));
                    }
                }
            }

            if !ContentHasher::CONTENT.verify(entry.content(), entry.content_hash()) {
                return Err(violation("content hash mismatch"));
            }

            if entry.header().hash() != entry.hash() {
                return Err(violation("entry hash mismatch"));
            }

            if !seen.insert(entry.hash()) {
                return Err(violation("duplicate entry hash"));
            }

            if let Some(verifier) = self.verifier {
                if !verifier.verify(&entry.hash(), entry.signature()) {
                    return Err(violation("signature does not verify"));
                }
            }
        }

        Ok(())
    }
}

impl Default for ChainValidator<'_> {
    fn default() -> Self {
        Self::new()
    }
}
