//! # Rusty-Board Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use anyhow::Context;
use configs::{LogSettings, Settings};
use rb_api::{configure_routes, middleware, AppState};
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use rb_db_sqlite::SqlitePostRepo;

#[cfg(feature = "storage-local")]
use rb_storage_local::LocalMediaStore;

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local")))]
compile_error!("rusty-board needs a database and a media store: enable `db-sqlite` and `storage-local`");

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    // 1. Initialize Database Implementation
    let repo = SqlitePostRepo::new(&settings.database.url, settings.database.max_connections)
        .await
        .context("failed to init SQLite")?;

    // 2. Initialize Storage Implementation
    let store = LocalMediaStore::new(
        settings.media.upload_dir.clone().into(),
        settings.media.url_prefix.clone(),
        settings.media.thumbnail_size,
    );
    tokio::fs::create_dir_all(store.root_path())
        .await
        .with_context(|| format!("failed to create {}", settings.media.upload_dir))?;

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = Arc::new(AppState {
        repo: Box::new(repo),
        store: Box::new(store),
        max_upload_bytes: settings.media.max_upload_bytes,
        board_title: settings.server.board_title.clone(),
    });

    let app = middleware::apply(
        configure_routes(state)
            .nest_service(&settings.media.url_prefix, ServeDir::new(&settings.media.upload_dir)),
    );

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 Rusty-Board starting on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}
