use async_trait::async_trait;
use tailchain_protocol::EntryEnvelope;
use tailchain_types::ChainHash;

use crate::error::SyncResult;

/// An entry fetched from a remote, as the remote described it.
#[derive(Clone, Debug)]
pub struct RemoteEntry {
    /// Identity the remote declared for this entry.
    pub hash: ChainHash,
    pub envelope: EntryEnvelope,
}

/// Source of entries for a [`Replicator`](crate::Replicator).
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// The entry after `cursor` (`None` for the first entry), waiting on the
    /// remote side until it exists.
    ///
    /// Cancellation is handled by dropping the returned future.
    async fn next_after(&self, cursor: Option<&ChainHash>) -> SyncResult<RemoteEntry>;
}
