//! Wire protocol for tailchain.
//!
//! An entry travels as an HTTP response: the content is the body and every
//! other field is a header. Resources are addressed by hex entry hash:
//!
//! - `GET /<hash>` returns the entry (HEAD: headers only)
//! - `GET /next/<hash>` long-polls for the entry after `<hash>` and redirects
//!   to it; an empty segment means the first entry
//!
//! This crate only encodes and decodes; it never touches a ledger's state.

pub mod envelope;
pub mod error;
pub mod headers;
pub mod instant;
pub mod path;

pub use envelope::EntryEnvelope;
pub use error::{ProtocolError, ProtocolResult};
pub use instant::{format_instant, parse_instant};
pub use path::{entry_path, next_path, parse_cursor_segment, parse_hash_segment};
