//! HTTP surface over the ledger engine and the currency gateway.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::application::LedgerService;
use crate::currency::{CurrencyGateway, CurrencySet};

pub use error::ApiError;
pub use routes::create_router;

/// Shared handles given to every handler. Built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub gateway: Arc<CurrencyGateway>,
    pub currencies: Arc<CurrencySet>,
}

impl AppState {
    pub fn new(ledger: LedgerService, gateway: CurrencyGateway, currencies: CurrencySet) -> Self {
        Self {
            ledger,
            gateway: Arc::new(gateway),
            currencies: Arc::new(currencies),
        }
    }
}

/// Serve the API on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let address = listener
        .local_addr()
        .context("Failed to read listener address")?;
    tracing::info!("listening on http://{}", address);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
