//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Every request carries an X-Request-Id; the replay after a refresh
//! reuses it, so both attempts share one id in logs and on the backend.
//! ```

pub mod logging;
pub mod metrics;
