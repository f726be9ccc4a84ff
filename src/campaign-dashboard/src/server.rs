//! HTTP server and metrics exporter.

use axum::Router;
use campaign_core::config::AppConfig;
use std::net::SocketAddr;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    app: Router,
}

impl ApiServer {
    pub fn new(config: AppConfig, app: Router) -> Self {
        Self { config, app }
    }

    /// Start the HTTP REST server. Blocks until shutdown.
    pub async fn start_http(self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }

    /// Start the Prometheus exporter on its own port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
