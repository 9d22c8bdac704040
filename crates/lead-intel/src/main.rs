mod application;
mod biomarker;
mod company;
mod compliance;
mod config;
mod email;
mod error;
mod export;
mod gateway;
mod model;
mod normalize;
mod pipeline;
mod record;
mod rules;
mod sample;
mod server;
mod stats;
mod store;
mod trial;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use gateway::Gateway;
use pipeline::LeadGenerator;
use server::AppState;
use store::{LeadStore, Snapshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting lead-intel service");

    let config = Config::from_env()?;
    info!(
        port = config.port,
        live_data = config.live_data,
        openfda = %config.registry.openfda_base_url,
        ctgov = %config.registry.ctgov_base_url,
        lookback_days = config.lookback_days,
        fetch_limit = config.fetch_limit,
        "configuration loaded"
    );

    let gateway = Gateway::new(&config)?;
    let store = Arc::new(LeadStore::new(Snapshot::empty(Utc::now())));
    let generator = Arc::new(LeadGenerator::new(
        gateway,
        Arc::clone(&store),
        config.credibility_seed,
    ));

    let initial = generator.regenerate().await;
    info!(leads = initial.leads().len(), "initial lead generation complete");

    let app = server::router(AppState::new(generator, config.top_leads));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("lead-intel shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
