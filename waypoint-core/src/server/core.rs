//! HTTP server for the workflow API

use crate::models::Configuration;
use crate::server::api::create_api_routes;
use crate::workflow::WorkflowOrchestrator;
use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Main waypoint server
pub struct WorkflowServer {
    host: String,
    port: u16,
    max_request_bytes: u64,
    orchestrator: Arc<WorkflowOrchestrator>,
}

impl WorkflowServer {
    /// Create a new waypoint server
    pub fn new(host: String, port: u16, orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        Self {
            host,
            port,
            max_request_bytes: Configuration::default().max_request_bytes,
            orchestrator,
        }
    }

    /// Create a server using the bind address and limits from `config`
    pub fn from_config(config: &Configuration, orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        Self::new(config.server_host.clone(), config.server_port, orchestrator)
            .with_max_request_bytes(config.max_request_bytes)
    }

    pub fn with_max_request_bytes(mut self, max_request_bytes: u64) -> Self {
        self.max_request_bytes = max_request_bytes;
        self
    }

    /// Parsed bind address
    pub fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Invalid server address")
    }

    /// Bind the listener; the returned future serves until `shutdown` resolves
    pub fn bind_with_shutdown<S>(
        self,
        shutdown: S,
    ) -> Result<(SocketAddr, impl Future<Output = ()> + 'static)>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let address = self.address()?;
        let routes = create_api_routes(self.orchestrator, self.max_request_bytes);

        warp::serve(routes)
            .try_bind_with_graceful_shutdown(address, shutdown)
            .with_context(|| format!("Failed to bind to {}", address))
    }

    /// Start the server and run until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let (address, server) = self.bind_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down server");
        })?;

        tracing::info!(address = %address, "waypoint server listening");
        server.await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::InMemoryWorkflowStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn orchestrator() -> Arc<WorkflowOrchestrator> {
        Arc::new(WorkflowOrchestrator::new(Arc::new(
            InMemoryWorkflowStore::new(),
        )))
    }

    #[test]
    fn test_invalid_address() {
        let server = WorkflowServer::new("not an address".to_string(), 8080, orchestrator());
        assert!(server.address().is_err());
    }

    #[tokio::test]
    async fn test_serves_health_until_shutdown() {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = WorkflowServer::new("127.0.0.1".to_string(), 0, orchestrator());
        let (address, serving) = server
            .bind_with_shutdown(async {
                let _ = stop_rx.await;
            })
            .unwrap();
        let handle = tokio::spawn(serving);

        let mut stream = TcpStream::connect(address).await.unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"status\":\"healthy\""));

        stop_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
