//! HTTP server for the Feishu OAuth proxy.

pub mod callback;
pub mod routes;

use std::net::SocketAddr;

use crate::proxy::ProxyService;

/// HTTP front end for a [`ProxyService`].
pub struct ProxyServer {
    service: ProxyService,
}

impl ProxyServer {
    /// Create a new server.
    #[must_use]
    pub fn new(service: ProxyService) -> Self {
        Self { service }
    }

    /// Build the router without binding a socket.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        routes::create_router(self.service.clone())
    }

    /// Run the server until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error on bind or server failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        self.log_banner(addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }

    fn log_banner(&self, addr: SocketAddr) {
        let config = self.service.config();

        tracing::info!("OAuth proxy listening on http://{}", addr);
        match &config.default_credential {
            Some(credential) => tracing::info!(
                app_id = %credential.masked_app_id(),
                has_app_secret = !credential.app_secret.is_empty(),
                "Default Feishu app configured"
            ),
            None => tracing::warn!(
                "No default Feishu app configured; requests must carry App ID and App Secret"
            ),
        }
        tracing::info!("Health check: http://{}{}", addr, routes::HEALTH_PATH);
        for (name, path) in routes::ENDPOINTS {
            tracing::info!(endpoint = *name, "http://{}{}", addr, path);
        }
    }
}

impl std::fmt::Debug for ProxyServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyServer").field("service", &self.service).finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
