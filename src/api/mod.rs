pub mod grpc;
pub mod http;

use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::info;

use crate::config::PluginConfig;
use crate::proto::{DataSourceServer, MetricServer};
use crate::service::MetricService;
use crate::{PluginError, Result};

use self::grpc::{DataSourceGrpc, MetricGrpc};

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Runs the gRPC plugin endpoint and the HTTP side port until either fails
/// or the process is interrupted.
pub async fn serve(config: &PluginConfig, service: MetricService) -> Result<()> {
    let grpc_addr = config.grpc_addr()?;
    let http_addr = config.http_addr()?;

    let grpc = Server::builder()
        .add_service(MetricServer::new(MetricGrpc::new(service.clone())))
        .add_service(DataSourceServer::new(DataSourceGrpc::new(service.clone())))
        .serve_with_shutdown(grpc_addr, shutdown_signal());

    let listener = TcpListener::bind(http_addr).await.map_err(|e|
        PluginError::Internal(format!("Failed to bind to address: {}", e)))?;
    let app = http::router(service);

    info!("Starting gRPC plugin server on {}", grpc_addr);
    info!("Starting HTTP server on {}", http_addr);

    tokio::try_join!(
        async {
            grpc.await.map_err(|e| PluginError::Internal(format!("gRPC server error: {}", e)))
        },
        async {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(|e| PluginError::Internal(format!("Server error: {}", e)))
        },
    )?;

    Ok(())
}
