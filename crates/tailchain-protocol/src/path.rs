use tailchain_types::ChainHash;

use crate::error::ProtocolResult;

/// Prefix of the long-poll resource.
pub const NEXT_PREFIX: &str = "/next/";

/// `/<hex>`: the entry resource.
pub fn entry_path(hash: &ChainHash) -> String {
    format!("/{hash}")
}

/// `/next/<hex>`, or `/next/` for the first entry.
pub fn next_path(cursor: Option<&ChainHash>) -> String {
    match cursor {
        Some(hash) => format!("{NEXT_PREFIX}{hash}"),
        None => NEXT_PREFIX.to_string(),
    }
}

/// Parse a hash path segment. Anything but exactly 64 hex digits is rejected.
pub fn parse_hash_segment(segment: &str) -> ProtocolResult<ChainHash> {
    Ok(ChainHash::from_hex(segment)?)
}

/// Parse a cursor path segment; empty means "before the first entry".
pub fn parse_cursor_segment(segment: &str) -> ProtocolResult<Option<ChainHash>> {
    if segment.is_empty() {
        return Ok(None);
    }
    parse_hash_segment(segment).map(Some)
}
