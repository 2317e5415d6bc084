//! Single-flight token refresh.
//!
//! # Responsibilities
//! - Exchange the refresh token for a new session
//! - Coalesce concurrent refreshes triggered by the same expired token
//! - Clear the session when a refresh is impossible or rejected
//!
//! # Design Decisions
//! - Callers serialize on one async gate; the first performs the network
//!   call, the rest find the token already rotated and reuse the result
//! - The stale token each caller was rejected with is what decides whether
//!   a new refresh is needed
//! - The exchange runs in a task owned by the refresher; a caller that gives
//!   up waiting (cancel, logout) does not abort it, so a rotation the
//!   backend already committed is still stored
//! - Results are only applied while the rejected token is still current; a
//!   logout or login in the meantime wins
//! - Refresh calls bypass the auth layer (no bearer, no replay)

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::observability::metrics;
use crate::session::{Session, SessionStore};

/// Why a refresh did not produce a session.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("refresh rejected with status {0}")]
    Rejected(StatusCode),

    #[error("refresh transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid refresh response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The session changed (logout, new login) while the refresh ran.
    #[error("session replaced during refresh")]
    Superseded,

    #[error("refresh task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

struct RefresherInner {
    http: reqwest::Client,
    endpoint: Url,
    origin: (HeaderName, HeaderValue),
    session: Arc<dyn SessionStore>,
    gate: Mutex<()>,
}

/// Performs token refreshes against the auth backend.
pub struct Refresher {
    inner: Arc<RefresherInner>,
}

impl Refresher {
    pub fn new(
        http: reqwest::Client,
        endpoint: Url,
        origin: (HeaderName, HeaderValue),
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                http,
                endpoint,
                origin,
                session,
                gate: Mutex::new(()),
            }),
        }
    }

    /// Obtain a session newer than `stale_token`.
    ///
    /// `stale_token` is the token the failed request was sent with. If the
    /// store already holds a different token, another caller refreshed in
    /// the meantime and that session is returned without a network call.
    ///
    /// Dropping the returned future stops the wait only; the refresh itself
    /// runs to completion.
    pub async fn refresh(&self, stale_token: Option<&str>) -> Result<Session, RefreshError> {
        let inner = self.inner.clone();
        let stale_token = stale_token.map(str::to_string);
        tokio::spawn(async move { inner.refresh(stale_token.as_deref()).await }).await?
    }
}

impl RefresherInner {
    async fn refresh(&self, stale_token: Option<&str>) -> Result<Session, RefreshError> {
        let _guard = self.gate.lock().await;

        let Some(current) = self.session.current() else {
            tracing::info!("No session to refresh");
            metrics::record_refresh("no_token");
            return Err(RefreshError::NoRefreshToken);
        };
        if let Some(stale) = stale_token {
            if current.token != stale {
                tracing::debug!("Session already refreshed by a concurrent request");
                metrics::record_refresh("coalesced");
                return Ok(current);
            }
        }

        let Some(refresh_token) = current.refresh_token.as_deref() else {
            tracing::info!("No refresh token available, clearing session");
            self.session.clear_if_current(&current.token);
            metrics::record_refresh("no_token");
            return Err(RefreshError::NoRefreshToken);
        };

        match self.exchange(refresh_token).await {
            Ok(session) => {
                if !self.session.replace_if_current(&current.token, session.clone()) {
                    tracing::info!("Session changed during refresh, discarding result");
                    metrics::record_refresh("superseded");
                    return Err(RefreshError::Superseded);
                }
                tracing::info!("Session refreshed");
                metrics::record_refresh("success");
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.session.clear_if_current(&current.token);
                metrics::record_refresh("failed");
                Err(e)
            }
        }
    }

    async fn exchange(&self, refresh_token: &str) -> Result<Session, RefreshError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(self.origin.0.clone(), self.origin.1.clone())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected(status));
        }

        let bytes = response.bytes().await?;
        let body: RefreshResponse = serde_json::from_slice(&bytes)?;
        Ok(Session {
            token: body.token,
            refresh_token: body
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
        })
    }
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;

    // Nothing listens on port 9; any exchange fails with a transport error.
    fn refresher(store: Arc<MemorySessionStore>) -> Refresher {
        Refresher::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9/auth/refresh-token").unwrap(),
            (
                HeaderName::from_static("x-app-origin"),
                HeaderValue::from_static("test"),
            ),
            store,
        )
    }

    #[tokio::test]
    async fn test_no_session_clears_without_network() {
        let store = Arc::new(MemorySessionStore::new());
        let refresher = refresher(store.clone());

        let err = refresher.refresh(Some("A")).await.unwrap_err();
        assert!(matches!(err, RefreshError::NoRefreshToken));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_clears_session() {
        let store = Arc::new(MemorySessionStore::with_session(Session {
            token: "A".into(),
            refresh_token: None,
        }));
        let refresher = refresher(store.clone());

        let err = refresher.refresh(Some("A")).await.unwrap_err();
        assert!(matches!(err, RefreshError::NoRefreshToken));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_rotated_token_is_reused() {
        let store = Arc::new(MemorySessionStore::with_session(Session::new("B", "R2")));
        let refresher = refresher(store.clone());

        let session = refresher.refresh(Some("A")).await.unwrap();
        assert_eq!(session.token, "B");
        assert_eq!(store.current(), Some(Session::new("B", "R2")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_clears_session() {
        let store = Arc::new(MemorySessionStore::with_session(Session::new("A", "R")));
        let refresher = refresher(store.clone());

        let err = refresher.refresh(Some("A")).await.unwrap_err();
        assert!(matches!(err, RefreshError::Transport(_)));
        assert!(store.current().is_none());
    }
}
