//! Background tasks that run next to the HTTP server.
//!
//! Both tasks stop when the shared cancellation token fires.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::main_lib::AppState;

/// Starts the quote ingestion loop.
pub fn start_quote_ingestion(state: Arc<AppState>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        state.ingestion_service.run(cancel).await;
    })
}

/// Starts the expiry sweeper, purging expired buckets every `interval`.
pub fn start_expiry_sweeper(
    state: Arc<AppState>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Expiry sweeper started ({:?} interval)", interval);

        while !cancel.is_cancelled() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
            run_expiry_sweep(&state).await;
        }

        info!("Expiry sweeper stopped");
    })
}

async fn run_expiry_sweep(state: &Arc<AppState>) {
    match state.quote_store.purge_expired().await {
        Ok(0) => debug!("Expiry sweep: nothing to purge"),
        Ok(purged) => info!("Expiry sweep purged {} buckets", purged),
        Err(e) => warn!("Expiry sweep failed: {}", e),
    }
}

/// Waits for background tasks after shutdown, logging any that panicked or
/// were aborted. Returns how many ended abnormally.
pub async fn join_tasks(tasks: Vec<(&'static str, JoinHandle<()>)>) -> usize {
    let mut failed = 0;
    for (name, handle) in tasks {
        if let Err(e) = handle.await {
            error!("Background task {} ended abnormally: {}", name, e);
            failed += 1;
        }
    }
    failed
}
