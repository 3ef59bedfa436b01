use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stop_router::config::AppConfig;
use stop_router::osrm::OsrmClient;
use stop_router::stops::{OverpassClient, StopFile, StopSet, StopSource};
use stop_router::store::FileStore;
use stop_router::web::{AppState, StopRouter, create_router};

/// How often to refresh the stop list (24 hours).
const STOP_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stop_router=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run(AppConfig::from_env()).await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let osrm = OsrmClient::new(config.osrm.clone())?;
    let store = FileStore::new(&config.cache_dir);
    let router = StopRouter::from_config(&config.router, osrm, store);

    let source = match &config.stops_file {
        Some(path) => StopSource::File(StopFile::new(path)),
        None => StopSource::Overpass(OverpassClient::new(config.overpass.clone())?),
    };

    // Start even when the source is down; the list can be refreshed later
    info!("Fetching stops...");
    let stops = match StopSet::load(source.clone()).await {
        Ok(stops) => {
            info!(stops = stops.len().await, "Loaded stops");
            stops
        }
        Err(e) => {
            warn!(error = %e, "Failed to load stops, starting with an empty list");
            StopSet::empty(source)
        }
    };

    // Spawn background task to refresh the stop list daily
    let stops_refresh = stops.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STOP_REFRESH_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match stops_refresh.refresh().await {
                Ok(count) => info!(stops = count, "Refreshed stops"),
                Err(e) => warn!(error = %e, "Failed to refresh stops"),
            }
        }
    });

    let app = create_router(AppState::new(router, stops));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        addr = %config.bind,
        model = %config.router.model,
        cache_dir = %config.cache_dir.display(),
        "Stop router listening"
    );
    info!("  GET    /health            - Health check");
    info!("  GET    /api/stops         - List stops");
    info!("  POST   /api/stops/refresh - Refetch stops");
    info!("  POST   /api/route         - Compute a route {{start, end}}");
    info!("  DELETE /api/caches        - Clear all caches");

    axum::serve(listener, app).await?;
    Ok(())
}
