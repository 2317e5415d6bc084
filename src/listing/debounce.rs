//! Latest-call-wins debounce.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Delays work until calls stop arriving for `interval`.
///
/// Each call to [`settle`](Debouncer::settle) takes a ticket and waits one
/// interval; only the call still holding the newest ticket afterwards gets
/// `true`. Superseded calls get `false` and should drop their work.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    latest: AtomicU64,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            latest: AtomicU64::new(0),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait out the interval. `true` if no later call arrived meanwhile.
    pub async fn settle(&self) -> bool {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.latest.load(Ordering::SeqCst) == ticket
    }
}
