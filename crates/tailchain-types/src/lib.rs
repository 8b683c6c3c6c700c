//! Foundation types for tailchain.
//!
//! Every other tailchain crate depends on `tailchain-types`.
//!
//! # Key Types
//!
//! - [`ChainHash`]: 32-byte digest used as entry identity, content digest,
//!   and index key. Hex is only a display and wire concern.

pub mod error;
pub mod hash;

pub use error::TypeError;
pub use hash::{ChainHash, HASH_LEN};
