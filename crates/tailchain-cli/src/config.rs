use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tailchain_server::ServerConfig;
use tailchain_sync::HttpConfig;

/// Defaults loaded from `--config`. Command-line flags win.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Key file: secret for `serve`, public for `observe` and `verify`.
    pub key: Option<PathBuf>,
    /// Remote base URL.
    pub target: Option<String>,
    pub server: ServerConfig,
    pub connect_timeout_secs: Option<u64>,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn key(&self, flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        flag.or_else(|| self.key.clone())
            .ok_or_else(|| anyhow!("no key file: pass --key or set `key` in the config file"))
    }

    pub fn target(&self, flag: Option<String>) -> anyhow::Result<String> {
        flag.or_else(|| self.target.clone())
            .ok_or_else(|| anyhow!("no remote: pass --target or set `target` in the config file"))
    }

    pub fn listen(&self, flag: Option<SocketAddr>) -> SocketAddr {
        flag.unwrap_or(self.server.bind_addr)
    }

    pub fn http(&self) -> HttpConfig {
        let mut config = HttpConfig::default();
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        config
    }
}
