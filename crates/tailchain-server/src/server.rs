use std::sync::Arc;

use tailchain_ledger::LedgerStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::AppState;
use crate::router::build_router;

/// Serves one ledger over HTTP.
pub struct ChainServer {
    config: ServerConfig,
    store: Arc<LedgerStore>,
}

impl ChainServer {
    pub fn new(config: ServerConfig, store: Arc<LedgerStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self, shutdown: CancellationToken) -> axum::Router {
        build_router(AppState {
            store: Arc::clone(&self.store),
            shutdown,
        })
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn serve(self, shutdown: CancellationToken) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires.
    ///
    /// Pending long-polls are released with 503 when shutting down, so the
    /// graceful drain does not wait on appends that will never come.
    pub async fn serve_on(self, listener: TcpListener, shutdown: CancellationToken) -> ServerResult<()> {
        let app = self.router(shutdown.clone());
        tracing::info!("chain server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        Ok(())
    }
}
