//! Append-only hash-chain ledger for tailchain.
//!
//! This crate is the heart of tailchain. It provides:
//! - [`Entry`] records whose identity is a digest over their own header and
//!   their predecessor's hash
//! - [`LedgerStore`], the in-memory owner of the chain: signed or verified
//!   appends, O(1) lookup by hash, and blocking tail reads
//! - [`ChainValidator`] for re-auditing a whole chain

pub mod entry;
pub mod error;
pub mod store;
pub mod validation;

pub use entry::{Entry, EntryHeader};
pub use error::{LedgerError, LedgerResult};
pub use store::{LedgerStore, LedgerStoreBuilder, LinkedEntry};
pub use validation::ChainValidator;
