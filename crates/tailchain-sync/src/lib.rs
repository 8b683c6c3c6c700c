//! Replication for tailchain.
//!
//! A [`Replicator`] pulls entries one at a time from a [`RemoteSource`] and
//! appends them to a local ledger. Nothing the remote declares is trusted:
//! the content digest is recomputed, and the local ledger re-derives the
//! entry hash and checks the signature with its own verifier.

pub mod error;
pub mod http;
pub mod local;
pub mod replicator;
pub mod transport;

pub use error::{SyncError, SyncResult};
pub use http::{HttpConfig, HttpRemote};
pub use local::LocalSource;
pub use replicator::Replicator;
pub use transport::{RemoteEntry, RemoteSource};
