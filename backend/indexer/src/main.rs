//! Voting Event Indexer: entry point.
//!
//! Starts a background indexer task that polls Soroban `getEvents` RPC for
//! voting contract events and persists them to SQLite. Newly counted votes are
//! pushed to a live tally, and a small Axum REST API serves events, vote
//! history and tallies to frontends.

mod api;
mod config;
mod db;
mod deployments;
mod errors;
mod events;
mod feed;
mod indexer;
mod rpc;

use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use feed::{LiveTally, VoteFeed};
use indexer::IndexerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let cancel = CancellationToken::new();
    let feed = VoteFeed::new(config.feed_capacity);

    // ─── Live tally ───────────────────────────────────────
    let live = LiveTally::new();
    let live_task = tokio::spawn(feed::run_live_tally(
        pool.clone(),
        live.clone(),
        feed.subscribe(),
        cancel.clone(),
    ));

    // ─── Background indexer ───────────────────────────────
    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        config: config.clone(),
        client,
        feed,
    });
    let indexer_task = tokio::spawn(indexer::run(indexer_state, cancel.clone()));

    // ─── REST API ─────────────────────────────────────────
    let api_state = Arc::new(api::ApiState { pool, live });

    let app = api::router(api_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
            shutdown.cancel();
        })
        .await?;

    // The server can also stop on its own; make sure the tasks follow.
    cancel.cancel();
    let _ = tokio::join!(indexer_task, live_task);
    info!("Indexer shut down cleanly");

    Ok(())
}
