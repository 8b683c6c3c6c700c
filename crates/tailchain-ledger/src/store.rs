use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use tailchain_crypto::{ContentHasher, EntrySigner, EntryVerifier};
use tailchain_types::ChainHash;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::entry::{Entry, EntryHeader};
use crate::error::{LedgerError, LedgerResult};
use crate::validation::ChainValidator;

/// In-memory append-only hash chain with blocking tail reads.
///
/// All reads and appends go through one reader/writer lock. Appends are
/// exclusive and totally ordered by lock acquisition; timestamps are a
/// validation rule, never a reordering rule.
///
/// Waiters never hold the lock while suspended. Each one subscribes to the
/// current generation under the read lock, releases it, and waits for the
/// generation to move. Every append bumps the generation under the write
/// lock, releasing all current waiters at once; each re-derives the entry it
/// is owed from its own cursor.
pub struct LedgerStore {
    signer: Option<Arc<dyn EntrySigner>>,
    verifier: Option<Arc<dyn EntryVerifier>>,
    inner: RwLock<LedgerState>,
}

struct LedgerState {
    entries: Vec<Arc<Entry>>,
    hash_index: HashMap<ChainHash, usize>,
    generation: watch::Sender<u64>,
}

impl LedgerState {
    fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            entries: Vec::new(),
            hash_index: HashMap::new(),
            generation,
        }
    }

    fn last(&self) -> Option<&Arc<Entry>> {
        self.entries.last()
    }

    fn position(&self, hash: &ChainHash) -> LedgerResult<usize> {
        self.hash_index
            .get(hash)
            .copied()
            .ok_or(LedgerError::EntryNotFound)
    }

    /// The entry following `cursor`, if it exists yet. An unknown cursor is an
    /// error regardless of chain length.
    fn after(&self, cursor: Option<&ChainHash>) -> LedgerResult<Option<Arc<Entry>>> {
        let next = match cursor {
            None => 0,
            Some(hash) => self.position(hash)? + 1,
        };
        Ok(self.entries.get(next).cloned())
    }
}

/// An entry together with the hash of its successor, if one exists yet.
#[derive(Clone, Debug)]
pub struct LinkedEntry {
    pub entry: Arc<Entry>,
    pub next_hash: Option<ChainHash>,
}

/// Builder for [`LedgerStore`]. At least one capability is required.
#[derive(Default)]
pub struct LedgerStoreBuilder {
    signer: Option<Arc<dyn EntrySigner>>,
    verifier: Option<Arc<dyn EntryVerifier>>,
}

impl LedgerStoreBuilder {
    /// Sign locally produced entries with `signer`.
    pub fn signer(mut self, signer: impl EntrySigner + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Check pre-signed (replicated) entries with `verifier`.
    pub fn verifier(mut self, verifier: impl EntryVerifier + 'static) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn build(self) -> LedgerResult<LedgerStore> {
        if self.signer.is_none() && self.verifier.is_none() {
            return Err(LedgerError::MissingCapabilities);
        }
        Ok(LedgerStore {
            signer: self.signer,
            verifier: self.verifier,
            inner: RwLock::new(LedgerState::new()),
        })
    }
}

impl LedgerStore {
    pub fn builder() -> LedgerStoreBuilder {
        LedgerStoreBuilder::default()
    }

    /// An authoritative ledger that signs what it appends.
    pub fn with_signer(signer: impl EntrySigner + 'static) -> Self {
        Self {
            signer: Some(Arc::new(signer)),
            verifier: None,
            inner: RwLock::new(LedgerState::new()),
        }
    }

    /// A mirror that only accepts entries carrying a valid signature.
    pub fn with_verifier(verifier: impl EntryVerifier + 'static) -> Self {
        Self {
            signer: None,
            verifier: Some(Arc::new(verifier)),
            inner: RwLock::new(LedgerState::new()),
        }
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Append `content` at `instant`.
    ///
    /// Without `external_signature` the entry is signed with the configured
    /// signer. With one, the signature is checked by the configured verifier
    /// against the locally derived hash and adopted as-is. The content is
    /// copied; the caller's buffer may be reused afterwards.
    ///
    /// Nothing is mutated unless the entry is accepted.
    pub fn append<Tz: TimeZone>(
        &self,
        content: &[u8],
        instant: DateTime<Tz>,
        external_signature: Option<&[u8]>,
    ) -> LedgerResult<Arc<Entry>> {
        let instant = instant.with_timezone(&Utc);
        let content_hash = ContentHasher::CONTENT.hash(content);

        let mut state = self.write()?;
        if let Some(last) = state.last() {
            if last.instant() > instant {
                return Err(LedgerError::IncorrectTimestamp);
            }
        }

        let header = EntryHeader {
            height: state.entries.len() as u64,
            instant,
            prev_hash: state.last().map(|e| e.hash()),
            content_hash,
        };
        let hash = header.hash();

        let signature = match external_signature {
            Some(signature) => {
                let verifier = self.verifier.as_ref().ok_or(LedgerError::MissingVerifier)?;
                if !verifier.verify(&hash, signature) {
                    return Err(LedgerError::VerificationFailed);
                }
                signature.to_vec()
            }
            None => {
                let signer = self.signer.as_ref().ok_or(LedgerError::MissingSigner)?;
                signer.sign(&hash)?
            }
        };

        if state.hash_index.contains_key(&hash) {
            tracing::error!(hash = %hash, height = header.height, "entry hash already indexed");
            return Err(LedgerError::HashCollision);
        }

        let entry = Arc::new(Entry {
            header,
            hash,
            content: Bytes::copy_from_slice(content),
            signature,
        });
        let position = state.entries.len();
        state.hash_index.insert(hash, position);
        state.entries.push(Arc::clone(&entry));
        state.generation.send_replace(state.entries.len() as u64);
        drop(state);

        tracing::debug!(height = position, hash = %hash.short_hex(), "appended entry");
        Ok(entry)
    }

    /// The entry after `cursor`, waiting for it if `cursor` is the tip.
    ///
    /// `None` asks for the first entry. Returns `EntryNotFound` immediately
    /// when `cursor` is not in the chain, and `Cancelled` when `cancel` fires
    /// while waiting. A failed wait consumes nothing: calling again with the
    /// same cursor sees the same outcome.
    pub async fn wait_for_next(
        &self,
        cursor: Option<&ChainHash>,
        cancel: &CancellationToken,
    ) -> LedgerResult<Arc<Entry>> {
        loop {
            let mut wakeup = {
                let state = self.read()?;
                if let Some(entry) = state.after(cursor)? {
                    return Ok(entry);
                }
                state.generation.subscribe()
            };

            tokio::select! {
                biased;
                changed = wakeup.changed() => {
                    // The sender lives as long as the ledger.
                    if changed.is_err() {
                        return Err(LedgerError::Cancelled);
                    }
                }
                _ = cancel.cancelled() => return Err(LedgerError::Cancelled),
            }
        }
    }

    /// Lookup by exact hash. Never blocks on appends beyond the lock.
    pub fn get(&self, hash: &ChainHash) -> LedgerResult<Arc<Entry>> {
        let state = self.read()?;
        let position = state.position(hash)?;
        Ok(Arc::clone(&state.entries[position]))
    }

    /// Lookup by exact hash, including the successor link.
    pub fn get_linked(&self, hash: &ChainHash) -> LedgerResult<LinkedEntry> {
        let state = self.read()?;
        let position = state.position(hash)?;
        Ok(LinkedEntry {
            entry: Arc::clone(&state.entries[position]),
            next_hash: state.entries.get(position + 1).map(|e| e.hash()),
        })
    }

    /// Hash of the entry following `hash`, if one has been appended.
    pub fn next_hash(&self, hash: &ChainHash) -> LedgerResult<Option<ChainHash>> {
        let state = self.read()?;
        let position = state.position(hash)?;
        Ok(state.entries.get(position + 1).map(|e| e.hash()))
    }

    /// The tip, or `None` while the chain is empty.
    pub fn last(&self) -> LedgerResult<Option<Arc<Entry>>> {
        Ok(self.read()?.last().cloned())
    }

    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read()?.entries.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.read()?.entries.is_empty())
    }

    /// Snapshot of every entry handle in chain order.
    pub fn entries(&self) -> LedgerResult<Vec<Arc<Entry>>> {
        Ok(self.read()?.entries.clone())
    }

    /// Re-audit the whole chain, including signatures when a verifier is
    /// configured.
    pub fn validate(&self) -> LedgerResult<()> {
        let entries = self.entries()?;
        let validator = match &self.verifier {
            Some(verifier) => ChainValidator::with_verifier(verifier.as_ref()),
            None => ChainValidator::new(),
        };
        validator.validate(&entries)
    }
}

impl fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.inner.read().map(|s| s.entries.len()).ok();
        f.debug_struct("LedgerStore")
            .field("len", &len)
            .field("signer", &self.signer.is_some())
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}
