//! Background tasks for the quality pipeline
//!
//! A single worker drains the processing queue; a reconciliation sweep
//! requeues uploads left in PROCESSING by a crashed pipeline run. Both
//! loops treat per-upload errors as log events, never as reasons to exit.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::services::upload::UploadService;

/// Drain the processing queue, one upload at a time
///
/// Exits only when every sender has been dropped.
pub async fn run_worker(uploads: Arc<UploadService>, mut queue_rx: mpsc::Receiver<Uuid>) {
    tracing::info!("Quality pipeline worker started");

    while let Some(upload_id) = queue_rx.recv().await {
        if let Err(e) = uploads.process_upload(upload_id).await {
            tracing::error!(upload_id = %upload_id, error = %e, "Upload processing failed");
        }
    }

    tracing::info!("Quality pipeline worker stopped");
}

/// Periodically requeue uploads stuck in PROCESSING
pub async fn run_reconciliation(
    uploads: Arc<UploadService>,
    sweep_interval: Duration,
    stuck_threshold_seconds: i64,
) {
    tracing::info!(
        interval_seconds = sweep_interval.as_secs(),
        threshold_seconds = stuck_threshold_seconds,
        "Reconciliation sweep started"
    );

    let mut ticker = tokio::time::interval(sweep_interval);
    // The first tick fires immediately; skip it so startup is quiet
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match uploads.requeue_stuck(stuck_threshold_seconds).await {
            Ok(requeued) if !requeued.is_empty() => {
                tracing::warn!(count = requeued.len(), "Requeued stuck uploads");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Reconciliation sweep failed");
            }
        }
    }
}
