//! OS signal handling.
//!
//! Ctrl+C aborts whatever the client has in flight instead of killing the
//! process mid-write; the interrupted call returns `ClientError::Cancelled`.

use std::sync::Arc;

use crate::lifecycle::Canceller;

/// Spawn a task that cancels in-flight requests on Ctrl+C.
pub fn cancel_on_ctrl_c(canceller: Arc<Canceller>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, cancelling in-flight requests");
                canceller.cancel_all();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl+C handler"),
        }
    })
}
