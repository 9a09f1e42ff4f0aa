use crate::config::GatewayConfig;
use crate::services::RagClient;
use crate::{build_router, AppState};
use gateway_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        crate::services::metrics::init_metrics();

        tokio::fs::create_dir_all(&config.upload.dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create upload directory {}: {}",
                    config.upload.dir,
                    e
                );
                AppError::from(e)
            })?;

        let rag_client = Arc::new(RagClient::new(&config.rag_service)?);

        let state = AppState {
            config: config.clone(),
            rag_client,
        };

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, rag_service = %config.rag_service.url, "Gateway listening");

        // ConnectInfo feeds the IP rate limiters when no proxy header is set.
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        );

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
