//! Session state and the token-provider seam.
//!
//! # Data Flow
//! ```text
//! login / refresh response
//!     → SessionStore::replace (new token pair)
//!
//! every outbound request
//!     → SessionStore::current (token snapshot attached as Bearer)
//!
//! refresh result (only while the rejected token is still current)
//!     → SessionStore::replace_if_current / clear_if_current
//!
//! logout / forbidden (policy)
//!     → SessionStore::clear
//! ```
//!
//! # Design Decisions
//! - The client receives its store at construction; nothing global
//! - Readers get a snapshot; a concurrent replace never tears a session
//! - Persistence failures are logged, never raised into the request path

pub mod file;
pub mod memory;

use serde::{Deserialize, Serialize};

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// Credentials issued by the backend on login or refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Access token sent as `Authorization: Bearer <token>`.
    pub token: String,

    /// Token exchanged for a new access token when the current one expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: Some(refresh_token.into()),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Access to the current session.
///
/// Implementations must be cheap to read; `current` runs on every request.
pub trait SessionStore: Send + Sync {
    /// Snapshot of the current session, if logged in.
    fn current(&self) -> Option<Session>;

    /// Install a new session (login or successful refresh).
    fn replace(&self, session: Session);

    /// Drop the session (logout).
    fn clear(&self);

    /// Install `session` only if the current token is still `expected`.
    /// Returns whether the swap happened.
    ///
    /// A refresh finishing after a logout or a new login must not bring the
    /// old session back. The default is check-then-act; stores that can
    /// should swap atomically.
    fn replace_if_current(&self, expected: &str, session: Session) -> bool {
        if self.current().is_some_and(|s| s.token == expected) {
            self.replace(session);
            true
        } else {
            false
        }
    }

    /// Drop the session only if the current token is still `expected`.
    fn clear_if_current(&self, expected: &str) -> bool {
        if self.current().is_some_and(|s| s.token == expected) {
            self.clear();
            true
        } else {
            false
        }
    }
}
