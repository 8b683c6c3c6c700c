use std::sync::Arc;

use tailchain_crypto::ContentHasher;
use tailchain_ledger::{Entry, EntryHeader, LedgerStore};
use tailchain_types::ChainHash;
use tokio_util::sync::CancellationToken;

use crate::error::{SyncError, SyncResult};
use crate::transport::{RemoteEntry, RemoteSource};

/// Mirrors one remote ledger into a local one.
///
/// Every fetched entry is re-checked before it lands: the content digest is
/// recomputed here, and the local ledger re-derives the entry hash and runs
/// the declared signature through its own verifier. The local ledger
/// therefore needs a verifier for the remote's signing key.
///
/// Errors end the loop. Retrying is up to the caller.
pub struct Replicator<R> {
    remote: R,
    local: Arc<LedgerStore>,
}

impl<R: RemoteSource> Replicator<R> {
    pub fn new(remote: R, local: Arc<LedgerStore>) -> Self {
        Self { remote, local }
    }

    pub fn local(&self) -> &Arc<LedgerStore> {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Replicate until an error occurs or `cancel` fires.
    ///
    /// Resumes from the local tip. Cancellation surfaces as
    /// [`SyncError::Cancelled`]; anything else is returned verbatim.
    pub async fn run(&self, cancel: &CancellationToken) -> SyncResult<()> {
        self.replicate(None, cancel).await
    }

    /// Replicate until the local ledger holds `count` entries.
    pub async fn run_until(&self, count: usize, cancel: &CancellationToken) -> SyncResult<()> {
        self.replicate(Some(count), cancel).await
    }

    async fn replicate(&self, limit: Option<usize>, cancel: &CancellationToken) -> SyncResult<()> {
        let mut cursor = self.local.last()?.map(|entry| entry.hash());
        tracing::info!(
            from = %cursor.map(|h| h.short_hex()).unwrap_or_else(|| "genesis".into()),
            "starting replication"
        );

        loop {
            if let Some(limit) = limit {
                if self.local.len()? >= limit {
                    return Ok(());
                }
            }
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let entry = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                step = self.step(cursor.as_ref()) => step?,
            };
            cursor = Some(entry.hash());
        }
    }

    /// Fetch the entry after `cursor`, verify it and append it locally.
    ///
    /// `cursor` must be the local tip; anything else shows up as a height
    /// mismatch.
    pub async fn step(&self, cursor: Option<&ChainHash>) -> SyncResult<Arc<Entry>> {
        let RemoteEntry {
            hash: declared,
            envelope,
        } = self.remote.next_after(cursor).await?;

        let tip = self.local.last()?;
        let expected = tip.as_ref().map_or(0, |entry| entry.height() + 1);
        if envelope.height != expected {
            return Err(SyncError::HeightMismatch {
                expected,
                declared: envelope.height,
            });
        }

        if !ContentHasher::CONTENT.verify(&envelope.content, &envelope.content_hash) {
            tracing::warn!(height = envelope.height, "remote content does not match its digest");
            return Err(SyncError::ContentMismatch {
                height: envelope.height,
            });
        }

        // The identity the local ledger will derive; checked before anything
        // is appended.
        let derived = EntryHeader {
            height: expected,
            instant: envelope.instant,
            prev_hash: tip.map(|entry| entry.hash()),
            content_hash: envelope.content_hash,
        }
        .hash();
        if derived != declared {
            tracing::error!(
                height = expected,
                declared = %declared,
                derived = %derived,
                "remote declared a different entry hash"
            );
            return Err(SyncError::HashMismatch { declared, derived });
        }

        let entry = self
            .local
            .append(&envelope.content, envelope.instant, Some(&envelope.signature))?;

        tracing::debug!(height = entry.height(), hash = %entry.hash().short_hex(), "replicated entry");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tailchain_crypto::SigningKey;
    use tailchain_ledger::LedgerError;
    use tailchain_server::{ChainServer, ServerConfig};
    use tokio::net::TcpListener;

    use crate::http::HttpRemote;
    use crate::local::LocalSource;


    struct Pair {
        remote: Arc<LedgerStore>,
        local: Arc<LedgerStore>,
    }

    impl Pair {
        fn new() -> Self {
            let key = SigningKey::generate();
            Self {
                local: Arc::new(LedgerStore::with_verifier(key.verifying_key())),
                remote: Arc::new(LedgerStore::with_signer(key)),
            }
        }

        fn append(&self, content: &str, secs: i64) -> Arc<Entry> {
            let instant = Utc.timestamp_opt(1_700_000_000 + secs, secs as u32).unwrap();
            self.remote.append(content.as_bytes(), instant, None).unwrap()
        }

        fn replicator(&self) -> Replicator<LocalSource> {
            Replicator::new(LocalSource::new(Arc::clone(&self.remote)), Arc::clone(&self.local))
        }

        fn assert_mirrored(&self) {
            let remote = self.remote.entries().unwrap();
            let local = self.local.entries().unwrap();
            assert_eq!(remote.len(), local.len());
            for (r, l) in remote.iter().zip(&local) {
                assert_eq!(r.hash(), l.hash());
                assert_eq!(r.content(), l.content());
                assert_eq!(r.instant(), l.instant());
                assert_eq!(r.signature(), l.signature());
                assert_eq!(r.content_hash(), l.content_hash());
            }
            assert_eq!(remote, local);
            self.local.validate().unwrap();
        }
    }

    /// Wraps a source and rewrites what it returns.
    struct Tampering<F> {
        inner: LocalSource,
        tamper: F,
    }

    #[async_trait]
    impl<F> RemoteSource for Tampering<F>
    where
        F: Fn(&mut RemoteEntry) + Send + Sync,
    {
        async fn next_after(&self, cursor: Option<&ChainHash>) -> SyncResult<RemoteEntry> {
            let mut entry = self.inner.next_after(cursor).await?;
            (self.tamper)(&mut entry);
            Ok(entry)
        }
    }

    fn tampered<F>(pair: &Pair, tamper: F) -> Replicator<Tampering<F>>
    where
        F: Fn(&mut RemoteEntry) + Send + Sync,
    {
        Replicator::new(
            Tampering {
                inner: LocalSource::new(Arc::clone(&pair.remote)),
                tamper,
            },
            Arc::clone(&pair.local),
        )
    }

    #[tokio::test]
    async fn mirrors_remote_chain() {
        let pair = Pair::new();
        for i in 0..5 {
            pair.append(&format!("entry-{i}"), i);
        }

        pair.replicator()
            .run_until(5, &CancellationToken::new())
            .await
            .unwrap();
        pair.assert_mirrored();
    }

    #[tokio::test]
    async fn follows_appends_made_while_running() {
        let pair = Pair::new();
        pair.append("a", 0);

        let replicator = pair.replicator();
        let cancel = CancellationToken::new();
        let run = {
            let cancel = cancel.clone();
            tokio::spawn(async move { replicator.run(&cancel).await })
        };

        for i in 1..4 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            pair.append(&format!("entry-{i}"), i);
        }

        let tip = pair.remote.last().unwrap().unwrap().hash();
        tokio::time::timeout(Duration::from_secs(5), async {
            while pair.local.last().unwrap().map(|e| e.hash()) != Some(tip) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        let result = run.await.unwrap();
        assert!(matches!(result, Err(SyncError::Cancelled)));
        pair.assert_mirrored();
    }

    #[tokio::test]
    async fn resumes_from_local_tip() {
        let pair = Pair::new();
        for i in 0..3 {
            pair.append(&format!("entry-{i}"), i);
        }
        let cancel = CancellationToken::new();
        pair.replicator().run_until(2, &cancel).await.unwrap();
        assert_eq!(pair.local.len().unwrap(), 2);

        pair.append("entry-3", 3);
        pair.replicator().run_until(4, &cancel).await.unwrap();
        pair.assert_mirrored();
    }

    #[tokio::test]
    async fn cancel_releases_idle_replicator() {
        let pair = Pair::new();
        let replicator = pair.replicator();
        let cancel = CancellationToken::new();
        let run = {
            let cancel = cancel.clone();
            tokio::spawn(async move { replicator.run(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .unwrap()
            .unwrap();
        assert!(result.unwrap_err().is_cancelled());
        assert!(pair.local.is_empty().unwrap());
    }

    #[tokio::test]
    async fn already_cancelled_does_not_fetch() {
        let pair = Pair::new();
        pair.append("a", 0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pair.replicator().run(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(pair.local.is_empty().unwrap());
    }

    #[tokio::test]
    async fn tampered_content_rejected() {
        let pair = Pair::new();
        pair.append("genuine", 0);
        let replicator = tampered(&pair, |entry: &mut RemoteEntry| {
            entry.envelope.content = "forged".into();
        });

        let err = replicator.step(None).await.unwrap_err();
        assert!(matches!(err, SyncError::ContentMismatch { height: 0 }));
        assert!(pair.local.is_empty().unwrap());
    }

    #[tokio::test]
    async fn forged_signature_rejected_by_local_verifier() {
        let pair = Pair::new();
        pair.append("genuine", 0);
        let intruder = SigningKey::generate();
        let replicator = tampered(&pair, move |entry: &mut RemoteEntry| {
            entry.envelope.signature = intruder.sign(entry.hash.as_bytes());
        });

        let err = replicator.step(None).await.unwrap_err();
        assert!(matches!(err, SyncError::Ledger(LedgerError::VerificationFailed)));
        assert!(pair.local.is_empty().unwrap());
    }

    #[tokio::test]
    async fn shifted_timestamp_fails_signature_check() {
        let pair = Pair::new();
        pair.append("genuine", 0);
        let replicator = tampered(&pair, |entry: &mut RemoteEntry| {
            entry.envelope.instant += chrono::Duration::seconds(1);
            // Relabel consistently so only the signature gives it away.
            entry.hash = EntryHeader {
                height: entry.envelope.height,
                instant: entry.envelope.instant,
                prev_hash: entry.envelope.prev_hash,
                content_hash: entry.envelope.content_hash,
            }
            .hash();
        });

        let err = replicator.step(None).await.unwrap_err();
        assert!(matches!(err, SyncError::Ledger(LedgerError::VerificationFailed)));
        assert!(pair.local.is_empty().unwrap());
    }

    #[tokio::test]
    async fn shifted_timestamp_without_relabel_is_hash_mismatch() {
        let pair = Pair::new();
        pair.append("genuine", 0);
        let replicator = tampered(&pair, |entry: &mut RemoteEntry| {
            entry.envelope.instant += chrono::Duration::seconds(1);
        });

        let err = replicator.step(None).await.unwrap_err();
        assert!(matches!(err, SyncError::HashMismatch { .. }));
        assert!(pair.local.is_empty().unwrap());
    }

    #[tokio::test]
    async fn wrong_declared_height_rejected() {
        let pair = Pair::new();
        pair.append("genuine", 0);
        let replicator = tampered(&pair, |entry: &mut RemoteEntry| {
            entry.envelope.height = 7;
        });

        let err = replicator.step(None).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::HeightMismatch {
                expected: 0,
                declared: 7
            }
        ));
    }

    #[tokio::test]
    async fn wrong_declared_hash_reported() {
        let pair = Pair::new();
        pair.append("genuine", 0);
        let replicator = tampered(&pair, |entry: &mut RemoteEntry| {
            entry.hash = ChainHash::from_hash([0xEE; 32]);
        });

        let err = replicator.step(None).await.unwrap_err();
        match err {
            SyncError::HashMismatch { declared, derived } => {
                assert_eq!(declared, ChainHash::from_hash([0xEE; 32]));
                assert_eq!(derived, pair.remote.last().unwrap().unwrap().hash());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(pair.local.is_empty().unwrap());

        // Nothing was skipped: an honest fetch from the same cursor still lands.
        let entry = pair.replicator().step(None).await.unwrap();
        assert_eq!(entry.hash(), pair.remote.last().unwrap().unwrap().hash());
    }

    #[tokio::test]
    async fn local_ledger_without_verifier_cannot_replicate() {
        let pair = Pair::new();
        pair.append("genuine", 0);
        let local = Arc::new(LedgerStore::with_signer(SigningKey::generate()));
        let replicator = Replicator::new(LocalSource::new(Arc::clone(&pair.remote)), local);

        let err = replicator.step(None).await.unwrap_err();
        assert!(matches!(err, SyncError::Ledger(LedgerError::MissingVerifier)));
    }

    async fn spawn_server(store: Arc<LedgerStore>) -> (String, CancellationToken) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let server = ChainServer::new(ServerConfig { bind_addr: addr }, store);
        tokio::spawn(server.serve_on(listener, shutdown.clone()));
        (format!("http://{addr}"), shutdown)
    }

    #[tokio::test]
    async fn mirrors_remote_over_http() {
        let pair = Pair::new();
        for i in 0..3 {
            pair.append(&format!("entry-{i}"), i);
        }
        let (target, shutdown) = spawn_server(Arc::clone(&pair.remote)).await;

        let replicator = Replicator::new(HttpRemote::new(&target).unwrap(), Arc::clone(&pair.local));
        let cancel = CancellationToken::new();
        replicator.run_until(3, &cancel).await.unwrap();

        // The tip request parks until the remote appends again.
        let pending = {
            let cancel = cancel.clone();
            tokio::spawn(async move { replicator.run_until(5, &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        pair.append("entry-3", 3);
        pair.append("entry-4", 4);

        tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        pair.assert_mirrored();
        shutdown.cancel();
    }

    #[tokio::test]
    async fn remote_shutdown_ends_replication_with_error() {
        let pair = Pair::new();
        let (target, shutdown) = spawn_server(Arc::clone(&pair.remote)).await;
        let replicator = Replicator::new(HttpRemote::new(&target).unwrap(), Arc::clone(&pair.local));

        let run = tokio::spawn(async move { replicator.run(&CancellationToken::new()).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();

        let err = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert!(!err.is_cancelled());
        assert!(
            matches!(err, SyncError::RemoteStatus { status: 503, .. } | SyncError::Http(_)),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_remote_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let pair = Pair::new();
        let replicator = Replicator::new(
            HttpRemote::new(&format!("http://{addr}")).unwrap(),
            Arc::clone(&pair.local),
        );
        let err = replicator.step(None).await.unwrap_err();
        assert!(matches!(err, SyncError::Http(_)));
    }
}
