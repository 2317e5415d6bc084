//! Request lifecycle management.
//!
//! # Data Flow
//! ```text
//! Cancellation (cancel.rs):
//!     cancel_all() → every CancelToken of the current generation resolves
//!     → in-flight execute() calls return ClientError::Cancelled
//!
//! Signals (signals.rs):
//!     SIGINT → cancel_all()
//! ```
//!
//! # Design Decisions
//! - Cancellation is best-effort; the backend stays the source of truth
//! - Generations instead of a one-shot flag: cancelling does not poison
//!   requests issued later (e.g., after navigating to another screen)

pub mod cancel;
pub mod signals;

pub use cancel::{CancelToken, Canceller};
