use std::sync::Arc;

use async_trait::async_trait;
use tailchain_ledger::LedgerStore;
use tailchain_protocol::EntryEnvelope;
use tailchain_types::ChainHash;
use tokio_util::sync::CancellationToken;

use crate::error::SyncResult;
use crate::transport::{RemoteEntry, RemoteSource};

/// Another ledger in the same process, read through the same seam as an
/// HTTP remote.
#[derive(Debug, Clone)]
pub struct LocalSource {
    store: Arc<LedgerStore>,
    // Never cancelled: callers stop a fetch by dropping it.
    idle: CancellationToken,
}

impl LocalSource {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            idle: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl RemoteSource for LocalSource {
    async fn next_after(&self, cursor: Option<&ChainHash>) -> SyncResult<RemoteEntry> {
        let entry = self.store.wait_for_next(cursor, &self.idle).await?;
        let linked = self.store.get_linked(&entry.hash())?;
        Ok(RemoteEntry {
            hash: entry.hash(),
            envelope: EntryEnvelope::from_linked(&linked),
        })
    }
}
