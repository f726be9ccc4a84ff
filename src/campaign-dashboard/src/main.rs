//! Campaign Dashboard: relationship-aware campaign management and analytics API.
//!
//! Main entry point that loads configuration, selects the record store and
//! starts the server.

mod server;

use campaign_core::config::{AppConfig, StoreBackend};
use campaign_management::{management_router, Maintainer, ManagementState};
use clap::Parser;
use server::ApiServer;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "campaign-dashboard")]
#[command(about = "Campaign, ad group and ad management with pivoted analytics")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short)]
    config: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CAMPAIGN_DASHBOARD__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Record store backend: memory or rest (overrides config)
    #[arg(long)]
    store_backend: Option<StoreBackend>,

    /// Base URL of the hosted record service (overrides config)
    #[arg(long)]
    store_url: Option<String>,

    /// JSON file to seed the memory backend with (overrides config)
    #[arg(long)]
    seed_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_dashboard=info,campaign_management=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Campaign Dashboard starting up");

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(backend) = cli.store_backend {
        config.store.backend = backend;
    }
    if let Some(url) = cli.store_url {
        config.store.url = url;
    }
    if let Some(path) = cli.seed_file {
        config.store.seed_file = Some(path);
    }

    info!(
        http_port = config.api.http_port,
        store = ?config.store.backend,
        row_limit = config.analytics.row_limit,
        "Configuration loaded"
    );

    let store = campaign_store::from_config(&config.store)?;
    let state = ManagementState {
        maintainer: Arc::new(Maintainer::new(store, config.validation.clone())),
        analytics: config.analytics.clone(),
    };

    let api_server = ApiServer::new(config.clone(), management_router(state));

    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Campaign Dashboard is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
