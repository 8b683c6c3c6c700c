use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Default port the chain is served on.
pub const DEFAULT_PORT: u16 = 6001;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:6001".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn deserializes_with_defaults() {
        let c: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(c, ServerConfig::default());

        let c: ServerConfig = toml::from_str("bind_addr = \"0.0.0.0:7000\"").unwrap();
        assert_eq!(c.bind_addr.port(), 7000);
    }
}
