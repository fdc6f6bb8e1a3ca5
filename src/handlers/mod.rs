//! NATS message handlers

pub mod dispatch;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use tracing::info;

use crate::config::Config;
use crate::services::optimizer::{create_optimizer, OptimizerClient};

/// Start all message handlers
pub async fn start_handlers(client: Client, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    let optimizer: Arc<dyn OptimizerClient> = Arc::from(create_optimizer(
        config.vroouty_url.clone(),
        config.vroouty_timeout_seconds,
    ));
    info!("Optimizer client: {}", optimizer.name());

    let before_sub = client.subscribe("dispatch.before_wave").await?;
    let after_sub = client.subscribe("dispatch.after_wave").await?;

    let before_handle = tokio::spawn(dispatch::handle_before_wave(
        client.clone(),
        before_sub,
        optimizer.clone(),
    ));
    let after_handle = tokio::spawn(dispatch::handle_after_wave(
        client.clone(),
        after_sub,
        optimizer.clone(),
    ));

    info!("All handlers started");

    let (before, after) = tokio::try_join!(before_handle, after_handle)?;
    before?;
    after?;

    Ok(())
}
