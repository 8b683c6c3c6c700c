//! Cryptographic primitives for tailchain.
//!
//! Provides domain-separated BLAKE3 hashing for content and entry headers,
//! the [`EntrySigner`] / [`EntryVerifier`] capabilities a ledger is built
//! with, and an Ed25519 implementation of both.
//!
//! The ledger only ever sees the capability traits, so the signature scheme
//! can be swapped without touching the chain logic.

pub mod capability;
pub mod hasher;
pub mod signer;

pub use capability::{EntrySigner, EntryVerifier};
pub use hasher::ContentHasher;
pub use signer::{SignatureError, SigningKey, VerifyingKey, SIGNATURE_LEN};
