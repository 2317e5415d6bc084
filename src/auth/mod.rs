//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request:
//!     → policy.rs (public endpoint? token present? else reject locally)
//!
//! Non-success response:
//!     → policy.rs (401 → refresh, 403 → per ForbiddenPolicy)
//!     → retry.rs (request's one-shot budget still available?)
//!     → refresh.rs (single-flight exchange of the refresh token)
//!     → replay once with the new token
//! ```
//!
//! # Design Decisions
//! - Refresh-and-replay runs at most once per original request
//! - Concurrent 401s share one refresh call
//! - Refresh failure clears the session; callers see their original error

pub mod policy;
pub mod refresh;
pub mod retry;

pub use policy::{AuthAction, AuthPolicy, PublicEndpoints};
pub use refresh::{RefreshError, Refresher};
pub use retry::AuthRetry;
