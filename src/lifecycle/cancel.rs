//! Collective cancellation of in-flight requests.

use std::future::Future;
use tokio::sync::watch;

/// Aborts every request in flight at the moment `cancel_all` is called.
///
/// Requests started afterwards are unaffected. Cancellation is advisory:
/// the backend may already have acted on an aborted request.
#[derive(Debug)]
pub struct Canceller {
    /// Generation counter; bumping it cancels every older token.
    tx: watch::Sender<u64>,
}

impl Canceller {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Token for one request, bound to the current generation.
    pub fn token(&self) -> CancelToken {
        let rx = self.tx.subscribe();
        let generation = *rx.borrow();
        CancelToken { rx, generation }
    }

    /// Abort everything currently in flight.
    pub fn cancel_all(&self) {
        self.tx.send_modify(|generation| *generation += 1);
        tracing::debug!(generation = *self.tx.borrow(), "Cancelled in-flight requests");
    }
}

impl Default for Canceller {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation handle held by a single request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<u64>,
    generation: u64,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() != self.generation
    }

    /// Resolves once `cancel_all` has been called after this token was made.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() != self.generation {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Canceller dropped: nothing can cancel us any more.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `fut` to completion unless cancelled first.
    pub async fn run<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}
