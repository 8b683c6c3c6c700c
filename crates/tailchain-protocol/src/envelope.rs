use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use tailchain_ledger::LinkedEntry;
use tailchain_types::ChainHash;

use crate::error::{ProtocolError, ProtocolResult};
use crate::headers::{X_BLOCK, X_CONTENT_HASH, X_DATE, X_HASH, X_NEXT_HASH, X_PREV_HASH, X_SIGN};
use crate::instant::{format_instant, parse_instant};

/// An entry as it crosses the wire: body plus headers.
///
/// Everything here is a declaration by the sender. Receivers recompute what
/// they can instead of trusting it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryEnvelope {
    pub hash: Option<ChainHash>,
    pub height: u64,
    pub instant: DateTime<Utc>,
    pub prev_hash: Option<ChainHash>,
    pub next_hash: Option<ChainHash>,
    pub content_hash: ChainHash,
    pub signature: Vec<u8>,
    pub content: Bytes,
}

impl EntryEnvelope {
    pub fn from_linked(linked: &LinkedEntry) -> Self {
        let entry = &linked.entry;
        Self {
            hash: Some(entry.hash()),
            height: entry.height(),
            instant: entry.instant(),
            prev_hash: entry.prev_hash().copied(),
            next_hash: linked.next_hash,
            content_hash: *entry.content_hash(),
            signature: entry.signature().to_vec(),
            content: entry.content().clone(),
        }
    }

    /// Response headers for this entry, `Content-Length` included.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.content.len()));
        if let Some(prev) = &self.prev_hash {
            headers.insert(X_PREV_HASH, hex_value(prev.as_bytes()));
        }
        if let Some(next) = &self.next_hash {
            headers.insert(X_NEXT_HASH, hex_value(next.as_bytes()));
        }
        if let Some(hash) = &self.hash {
            headers.insert(X_HASH, hex_value(hash.as_bytes()));
        }
        headers.insert(X_BLOCK, HeaderValue::from(self.height));
        headers.insert(X_DATE, ascii_value(format_instant(&self.instant)));
        headers.insert(X_CONTENT_HASH, hex_value(self.content_hash.as_bytes()));
        headers.insert(X_SIGN, hex_value(&self.signature));
        headers
    }

    /// Decode from response headers and body.
    pub fn from_parts(headers: &HeaderMap, content: Bytes) -> ProtocolResult<Self> {
        if let Some(declared) = optional_str(headers, &CONTENT_LENGTH)? {
            let declared: u64 = declared
                .parse()
                .map_err(|_| invalid(&CONTENT_LENGTH, "not a decimal length"))?;
            if declared != content.len() as u64 {
                return Err(ProtocolError::LengthMismatch {
                    declared,
                    actual: content.len(),
                });
            }
        }

        let height = required_str(headers, &X_BLOCK)?
            .parse()
            .map_err(|_| invalid(&X_BLOCK, "not a decimal height"))?;
        let instant = parse_instant(required_str(headers, &X_DATE)?)?;
        let content_hash = parse_hash(headers, &X_CONTENT_HASH)?
            .ok_or_else(|| ProtocolError::MissingHeader(X_CONTENT_HASH.to_string()))?;
        let signature = hex::decode(required_str(headers, &X_SIGN)?)
            .map_err(|e| invalid(&X_SIGN, &e.to_string()))?;

        Ok(Self {
            hash: parse_hash(headers, &X_HASH)?,
            height,
            instant,
            prev_hash: parse_hash(headers, &X_PREV_HASH)?,
            next_hash: parse_hash(headers, &X_NEXT_HASH)?,
            content_hash,
            signature,
            content,
        })
    }
}

fn hex_value(bytes: &[u8]) -> HeaderValue {
    ascii_value(hex::encode(bytes))
}

fn ascii_value(s: String) -> HeaderValue {
    // Hex digits, decimal digits and ':' are always valid header bytes.
    HeaderValue::try_from(s).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn invalid(name: &HeaderName, reason: &str) -> ProtocolError {
    ProtocolError::InvalidHeader {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn optional_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> ProtocolResult<Option<&'a str>> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| invalid(name, "not visible ASCII")))
        .transpose()
}

fn required_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> ProtocolResult<&'a str> {
    optional_str(headers, name)?.ok_or_else(|| ProtocolError::MissingHeader(name.to_string()))
}

fn parse_hash(headers: &HeaderMap, name: &HeaderName) -> ProtocolResult<Option<ChainHash>> {
    match optional_str(headers, name)? {
        None | Some("") => Ok(None),
        Some(s) => ChainHash::from_hex(s)
            .map(Some)
            .map_err(|e| invalid(name, &e.to_string())),
    }
}
