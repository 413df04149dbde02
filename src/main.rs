//! Eventi server - Binary Entry Point

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use eventi::api::{create_router, AppState};
use eventi::utils::init_logger;
use eventi::{AppConfig, Archiver, Database, IndexSynchronizer, SearchIndex};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger("info");

    let config = AppConfig::from_env()?;
    info!(
        version = eventi::VERSION,
        data_dir = %config.data_dir.display(),
        "Starting eventi"
    );

    let db = Arc::new(Database::open(config.journal_config())?);
    let index = SearchIndex::open(config.index_dir())?;
    let sync = IndexSynchronizer::new(Arc::clone(&db), index);

    if sync.needs_rebuild() {
        sync.rebuild().await?;
    } else if let Err(e) = sync.drain().await {
        warn!(error = %e, "Startup drain failed, the sweep will retry");
    }

    let shutdown = CancellationToken::new();

    let archiver = Archiver::new(Arc::clone(&db), config.archiver_interval);
    let archiver_task = tokio::spawn(archiver.run(shutdown.clone()));
    let sweep_task = tokio::spawn(sync.clone().run(config.sync_interval, shutdown.clone()));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                signal_token.cancel();
            }
            Err(e) => error!(error = %e, "Could not listen for Ctrl-C"),
        }
    });

    let app = create_router(Arc::new(AppState::new(db, sync)));
    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "Server listening");

    let server_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await?;

    shutdown.cancel();
    let _ = tokio::join!(archiver_task, sweep_task);
    info!("Server stopped");
    Ok(())
}
