use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use tailchain_protocol::{next_path, parse_hash_segment, EntryEnvelope};
use tailchain_types::ChainHash;

use crate::error::{SyncError, SyncResult};
use crate::transport::{RemoteEntry, RemoteSource};

/// Client settings for [`HttpRemote`].
///
/// There is no overall request timeout: `/next/` requests park on the
/// remote until it appends, which may take arbitrarily long.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("tailchain/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A remote ledger reached over HTTP.
///
/// Each fetch is a `GET /next/<cursor>` that the client follows through the
/// redirect to `/<hash>`; the redirect target names the entry.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base: Url,
}

impl HttpRemote {
    pub fn new(target: &str) -> SyncResult<Self> {
        Self::with_config(target, HttpConfig::default())
    }

    pub fn with_config(target: &str, config: HttpConfig) -> SyncResult<Self> {
        let base = Url::parse(target).map_err(|e| SyncError::InvalidTarget {
            target: target.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(SyncError::InvalidTarget {
                target: target.to_string(),
                reason: "not a base URL".into(),
            });
        }

        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, cursor: Option<&ChainHash>) -> SyncResult<Url> {
        self.base
            .join(&next_path(cursor))
            .map_err(|e| SyncError::InvalidTarget {
                target: self.base.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn next_after(&self, cursor: Option<&ChainHash>) -> SyncResult<RemoteEntry> {
        let url = self.url_for(cursor)?;
        tracing::debug!("requesting {}", url);

        let response = self.client.get(url).send().await?;
        let final_url = response.url().clone();
        if response.status() != StatusCode::OK {
            return Err(SyncError::RemoteStatus {
                status: response.status().as_u16(),
                url: final_url.to_string(),
            });
        }

        let segment = final_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        let hash = parse_hash_segment(segment)?;

        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let envelope = EntryEnvelope::from_parts(&headers, body)?;
        Ok(RemoteEntry { hash, envelope })
    }
}
