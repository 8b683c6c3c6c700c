//! HTTP server for tailchain.
//!
//! Maps ledger operations onto the wire protocol: fetch by hash, fetch the
//! first entry, and long-poll for the entry after a cursor. No validation
//! happens here beyond parsing; the ledger decides everything.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::ChainServer;
