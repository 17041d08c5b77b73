use std::sync::Arc;

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tracing_subscriber::EnvFilter;

use camp_api::config::Config;
use camp_api::geocoder::{Geocoder, NoGeocoder, TableGeocoder};
use camp_api::mailer::LogMailer;
use camp_api::models::create_collections;
use camp_api::routes;
use camp_api::seed::seed;
use camp_api::state::AppState;
use camp_api::upload::PhotoStore;
use camp_store::{DocumentStore, MemoryStore};

async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            eprintln!("failed to register SIGTERM handler: {e}");
            std::process::exit(1);
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse().validate().unwrap_or_else(|e| {
        eprintln!("invalid configuration: {e}");
        std::process::exit(1);
    });

    let store = Arc::new(MemoryStore::new());
    if let Err(e) = create_collections(store.as_ref()) {
        eprintln!("failed to create collections: {e}");
        std::process::exit(1);
    }

    let geocoder: Arc<dyn Geocoder> = match &config.geocoder_table {
        Some(path) => {
            let table = TableGeocoder::load(path).unwrap_or_else(|e| {
                eprintln!("failed to load geocoder table {}: {e}", path.display());
                std::process::exit(1);
            });
            tracing::info!(entries = table.len(), "loaded geocoder table");
            Arc::new(table)
        }
        None => {
            tracing::warn!("no geocoder table configured; address lookups will fail");
            Arc::new(NoGeocoder)
        }
    };

    if let Some(dir) = &config.seed_dir {
        if let Err(e) = seed(store.as_ref(), geocoder.as_ref(), dir).await {
            eprintln!("failed to seed from {}: {e}", dir.display());
            std::process::exit(1);
        }
    }

    let addr = config.listen_addr();
    let state = AppState {
        store: store.clone(),
        photos: Arc::new(PhotoStore::new(&config.upload_dir)),
        config: Arc::new(config),
        geocoder,
        mailer: Arc::new(LogMailer),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        });

    tracing::info!(%addr, "camp-api listening");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("server error: {e}");
    }

    store.close();
}
