use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_planner::config::AppConfig;
use transit_planner::network::{NetworkBuilder, NetworkBuilderConfig};
use transit_planner::planner::RoutePlanner;
use transit_planner::repository::{SyncError, TransportRepository};
use transit_planner::source::{ArcGisClient, ConfiguredSource, MockFeatureSource};
use transit_planner::store::JsonFileStore;
use transit_planner::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transit_planner=info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let store = Arc::new(JsonFileStore::open(&config.data_path)?);

    let source = match &config.mock_data_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "using mock feature source");
            ConfiguredSource::Mock(MockFeatureSource::new(dir)?)
        }
        None => ConfiguredSource::ArcGis(ArcGisClient::new(config.arcgis.clone())?),
    };

    let repository = Arc::new(TransportRepository::new(
        source,
        store,
        NetworkBuilder::new(NetworkBuilderConfig::default()),
        RoutePlanner::default(),
    ));

    // Serve stale or empty data rather than refusing to start.
    match repository.ensure_synced(false).await {
        Ok(metadata) => info!(
            stops = metadata.stop_count,
            lines = metadata.line_count,
            synced_at = %metadata.synced_at,
            "network ready"
        ),
        Err(e) => warn!(error = %e, "initial sync failed; serving stored network"),
    }

    // Periodic re-sync
    let refresh = Arc::clone(&repository);
    let interval = config.sync_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // First tick is immediate, skip it
        loop {
            ticker.tick().await;
            match refresh.sync().await {
                Ok(report) => info!(version = report.version, "scheduled sync finished"),
                Err(SyncError::Superseded { .. }) => {}
                Err(e) => warn!(error = %e, "scheduled sync failed"),
            }
        }
    });

    let app = create_router(AppState::new(repository));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "transit planner listening");
    info!("  GET  /health");
    info!("  GET  /api/stops/search?q=&limit=");
    info!("  GET  /api/stops/:id");
    info!("  GET  /api/lines/:id/stops");
    info!("  GET  /api/routes?from=&to=");
    info!("  GET  /api/map");
    info!("  GET  /api/sync/status");
    info!("  POST /api/sync");

    axum::serve(listener, app).await?;
    Ok(())
}
