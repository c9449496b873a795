use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;

mod api;
mod config;
mod error;
mod models;
mod repositories;
mod services;
mod utils;

use crate::config::Config;
use crate::repositories::DelegationRepository;
use crate::services::poller::Poller;
use crate::services::database;
use crate::services::scheduler::SyncScheduler;
use crate::services::tzkt::TzktClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("Starting Tezos delegation indexer");
    let config = Config::from_env()?;

    let mongo = database::connect_to_database(&config).await?;
    let repository = Arc::new(DelegationRepository::new(
        &mongo,
        &config.db_name,
        &config.collection,
    ));
    repository.ensure_indexes().await?;

    let client = Arc::new(TzktClient::new(&config)?);
    let poller = Arc::new(Poller::new(repository.clone(), client));

    let mut scheduler = SyncScheduler::new(poller, &config).await?;
    scheduler.start().await?;
    info!("Sync scheduled with cron expression {:?}", config.sync_cron);

    let app = api::router(repository, &config);
    let listener = tokio::net::TcpListener::bind(&config.api_addr).await?;
    info!("Serving delegations on {}", config.api_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    info!("Indexer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
