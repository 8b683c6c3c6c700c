use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tailchain_crypto::ContentHasher;
use tailchain_types::ChainHash;

/// The hashed part of an entry.
///
/// An entry's identity is the digest of this header's canonical encoding, so
/// every field here is covered by the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EntryHeader {
    /// Zero-based position in the chain.
    pub height: u64,
    /// When the entry was produced, always UTC.
    pub instant: DateTime<Utc>,
    /// Hash of the preceding entry; `None` at height 0.
    pub prev_hash: Option<ChainHash>,
    /// Digest of the entry content.
    pub content_hash: ChainHash,
}

impl EntryHeader {
    /// Fixed-width encoding of the header:
    /// `prev flag (1) | prev (0 or 32) | height (8) | secs (8) | nanos (4) | content hash (32)`,
    /// integers big-endian.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 32 + 8 + 8 + 4 + 32);
        match &self.prev_hash {
            Some(prev) => {
                buf.push(1);
                buf.extend_from_slice(prev.as_bytes());
            }
            None => buf.push(0),
        }
        buf.extend_from_slice(&self.height.to_be_bytes());
        buf.extend_from_slice(&self.instant.timestamp().to_be_bytes());
        buf.extend_from_slice(&self.instant.timestamp_subsec_nanos().to_be_bytes());
        buf.extend_from_slice(self.content_hash.as_bytes());
        buf
    }

    /// The entry identity derived from this header.
    pub fn hash(&self) -> ChainHash {
        ContentHasher::ENTRY.hash(&self.canonical_bytes())
    }
}

/// One record in the chain.
///
/// Entries are immutable once sealed. The successor link is not stored here;
/// the ledger derives it from the following entry's `prev_hash`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    #[serde(flatten)]
    pub(crate) header: EntryHeader,
    pub(crate) hash: ChainHash,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub(crate) content: Bytes,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub(crate) signature: Vec<u8>,
}

impl Entry {
    /// Seal a header with its content and signature, deriving the identity.
    #[cfg(test)]
    pub(crate) fn seal(header: EntryHeader, content: Bytes, signature: Vec<u8>) -> Self {
        Self {
            hash: header.hash(),
            header,
            content,
            signature,
        }
    }

    /// The entry identity: digest over the canonical header.
    pub fn hash(&self) -> ChainHash {
        self.hash
    }

    pub fn header(&self) -> &EntryHeader {
        &self.header
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.header.instant
    }

    pub fn prev_hash(&self) -> Option<&ChainHash> {
        self.header.prev_hash.as_ref()
    }

    pub fn content_hash(&self) -> &ChainHash {
        &self.header.content_hash
    }

    /// The payload. Cloning the returned `Bytes` is cheap and shares the
    /// ledger's copy.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("height", &self.header.height)
            .field("hash", &self.hash)
            .field("instant", &self.header.instant)
            .field("content_len", &self.content.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn header(prev: Option<ChainHash>) -> EntryHeader {
        EntryHeader {
            height: 3,
            instant: Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap(),
            prev_hash: prev,
            content_hash: ContentHasher::CONTENT.hash(b"payload"),
        }
    }

    #[test]
    fn canonical_bytes_are_fixed_width() {
        assert_eq!(header(None).canonical_bytes().len(), 1 + 8 + 8 + 4 + 32);
        let linked = header(Some(ChainHash::from_hash([1; 32])));
        assert_eq!(linked.canonical_bytes().len(), 1 + 32 + 8 + 8 + 4 + 32);
    }

    #[test]
    fn hash_covers_every_field() {
        let base = header(Some(ChainHash::from_hash([1; 32])));
        let base_hash = base.hash();

        let mut h = base;
        h.height += 1;
        assert_ne!(h.hash(), base_hash);

        let mut h = base;
        h.instant = Utc.timestamp_opt(1_700_000_000, 123_456_790).unwrap();
        assert_ne!(h.hash(), base_hash);

        let mut h = base;
        h.prev_hash = Some(ChainHash::from_hash([2; 32]));
        assert_ne!(h.hash(), base_hash);

        let mut h = base;
        h.content_hash = ContentHasher::CONTENT.hash(b"other");
        assert_ne!(h.hash(), base_hash);
    }

    #[test]
    fn missing_prev_differs_from_zero_prev() {
        let none = header(None);
        let zero = header(Some(ChainHash::from_hash([0; 32])));
        assert_ne!(none.hash(), zero.hash());
    }

    #[test]
    fn seal_caches_header_hash() {
        let h = header(None);
        let entry = Entry::seal(h, Bytes::from_static(b"payload"), vec![9; 4]);
        assert_eq!(entry.hash(), h.hash());
        assert_eq!(entry.height(), 3);
        assert_eq!(entry.signature(), &[9, 9, 9, 9]);
        assert!(entry.prev_hash().is_none());
    }

    #[test]
    fn json_dump_uses_hex() {
        let entry = Entry::seal(header(None), Bytes::from_static(b"ab"), vec![0xFF]);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["content"], "6162");
        assert_eq!(value["signature"], "ff");
        assert_eq!(value["height"], 3);
        assert!(value["prev_hash"].is_null());
        assert_eq!(value["hash"], entry.hash().to_hex());
    }
}
