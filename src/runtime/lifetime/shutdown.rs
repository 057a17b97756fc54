use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use crate::runtime::background::{BackgroundSummary, BackgroundTasks};

/// 等待 Ctrl+C 信号
///
/// Failing to install the handler is logged and treated as a shutdown
/// request.
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping...");
        }
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.", e);
        }
    }
}

/// Stop the metric tasks after the HTTP server has stopped accepting
/// requests, so the final request window includes every served request.
pub async fn stop_background_tasks(tasks: BackgroundTasks, grace: Duration) -> BackgroundSummary {
    let summary = tasks.shutdown(grace).await;
    match (summary.cache_reports, summary.request_stats) {
        (Some(reports), Some(_)) => {
            info!(
                "All background tasks stopped ({} cache reports emitted)",
                reports
            );
        }
        _ => {
            warn!("Some background tasks did not stop cleanly within {:?}", grace);
        }
    }
    summary
}
