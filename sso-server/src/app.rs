//! gRPC server lifecycle: bind, serve, drain on shutdown.

use anyhow::Context;
use sso_core::AuthService;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tonic::transport::Server;
use tracing::info;

use crate::transport::AuthGrpcService;

#[derive(Debug)]
pub struct GrpcApp {
    service: Arc<AuthService>,
    request_timeout: Duration,
}

impl GrpcApp {
    pub fn new(service: Arc<AuthService>, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    /// Serve until `shutdown` resolves, then stop accepting connections and
    /// let in-flight requests finish.
    pub async fn run<F>(self, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!(%addr, timeout = ?self.request_timeout, "gRPC server listening");

        Server::builder()
            .timeout(self.request_timeout)
            .add_service(AuthGrpcService::new(self.service).into_server())
            .serve_with_shutdown(addr, shutdown)
            .await
            .with_context(|| format!("gRPC server on {addr} failed"))?;

        info!("gRPC server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
