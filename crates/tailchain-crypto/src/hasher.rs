use tailchain_types::ChainHash;

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a payload and an entry header with identical bytes never
/// produce the same digest.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for entry payloads.
    pub const CONTENT: Self = Self {
        domain: "tailchain-content-v1",
    };
    /// Hasher for canonical entry headers (the entry identity).
    pub const ENTRY: Self = Self {
        domain: "tailchain-entry-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ChainHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ChainHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &ChainHash) -> bool {
        self.hash(data) == *expected
    }
}
