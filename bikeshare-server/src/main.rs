use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bikeshare_server::config::{Backend, ServerConfig};
use bikeshare_server::import::import_stations;
use bikeshare_server::mutator::LiveMutator;
use bikeshare_server::service::StationService;
use bikeshare_server::snapshot::load_snapshot;
use bikeshare_server::store::{InMemoryStationStore, RemoteStationStore, StationStore};
use bikeshare_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bikeshare_server=debug")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    info!(backend = %config.backend, bind = %config.bind, "starting bike-share server");

    let shutdown = CancellationToken::new();

    match config.backend {
        Backend::Memory => {
            let stations = load_snapshot(&config.snapshot_path)?;
            let store = InMemoryStationStore::new(stations);
            info!(stations = store.len().await, "in-memory store ready");

            // Only the in-process store gets the live feed.
            let mutator = LiveMutator::new(store.clone(), config.mutator.clone())
                .spawn(shutdown.clone());

            serve(store, &config, shutdown).await?;
            mutator.await?;
        }
        Backend::Remote => {
            let store = RemoteStationStore::new(&config.document_store)?;
            info!(url = %config.document_store.base_url, "using remote document store");

            if config.import_snapshot {
                let stations = load_snapshot(&config.snapshot_path)?;
                import_stations(&store, stations).await?;
            }

            serve(store, &config, shutdown).await?;
        }
    }

    info!("server stopped");
    Ok(())
}

/// Serve the API over `store` until ctrl-c, then cancel `shutdown`.
async fn serve<S: StationStore + 'static>(
    store: S,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let service = StationService::new(Arc::new(store), &config.cache);
    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("listening on http://{}", config.bind);
    info!("  GET  /health");
    info!("  GET  /api/v2/stations");
    info!("  GET  /api/v2/stations/summary");
    info!("  GET  /api/v2/stations/:number");
    info!("  POST /api/v2/stations");
    info!("  PUT  /api/v2/stations/:number");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
                _ = signal.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    Ok(())
}
