//! projtree HTTP server
//!
//! Serves project file trees over HTTP. Run behind a proxy that
//! authenticates callers and sets the `x-projtree-subject` header.
//!
//! Usage:
//!   projtree-server --port 8080 --db projtree.db --blob-db projtree-blobs.db

use std::{path::PathBuf, sync::Arc, time::Duration};
use anyhow::{Context, Result};
use clap::Parser;
use projtree_blobstore::BlobStore;
use projtree_db::DbConfig;
use projtree_server::{AppState, build_router};
use projtree_store::{EntryRepository, RecordStore};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "projtree-server")]
#[command(about = "HTTP API for projtree project trees")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the entry database
    #[arg(long, default_value = "projtree.db")]
    db: PathBuf,

    /// Path to the blob database
    #[arg(long, default_value = "projtree-blobs.db")]
    blob_db: PathBuf,

    /// How long a writer waits for the database lock, in milliseconds
    #[arg(long, default_value = "5000")]
    busy_timeout_ms: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("projtree server starting...");
    let config = DbConfig {
        busy_timeout: Duration::from_millis(args.busy_timeout_ms),
        ..DbConfig::default()
    };
    let records = RecordStore::open(&args.db, &config)
        .with_context(|| format!("opening entry database {}", args.db.display()))?;
    let blobs = BlobStore::open(&args.blob_db, &config)
        .with_context(|| format!("opening blob database {}", args.blob_db.display()))?;

    let repo = EntryRepository::new(records, Arc::new(blobs));
    let app = build_router(AppState::new(repo));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("binding port {}", args.port))?;
    info!(port = args.port, db = %args.db.display(), "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("projtree server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
