//! cli::commands::serve
//!
//! `mender serve` - run the HTTP API.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::Components;
use crate::config::Config;
use crate::server::{router, AppState, LocalInvoker};

/// Serve the HTTP API until the process is terminated.
pub async fn run(config: Config) -> Result<()> {
    let components = Components::from_config(&config);
    let invoker = Arc::new(LocalInvoker::new(
        Arc::clone(&components.scanner),
        Arc::clone(&components.analyzer),
        Arc::clone(&components.deploy),
    ));
    let state = AppState::new(Arc::clone(&components.store), invoker);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "mender API listening");

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
