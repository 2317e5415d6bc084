//! Which requests may go out without a token, and what an auth failure means.

use reqwest::StatusCode;
use url::Url;

use crate::config::{AuthConfig, ForbiddenPolicy};

/// Endpoints that may be called without a session token.
#[derive(Debug, Clone)]
pub struct PublicEndpoints {
    paths: Vec<String>,
}

impl PublicEndpoints {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| p.into().trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A URL is public when its path equals an entry or ends with it on a
    /// segment boundary (`/login` matches `/api/auth/login`, not `/relogin`).
    pub fn contains(&self, url: &Url) -> bool {
        let path = url.path().trim_end_matches('/');
        self.paths.iter().any(|entry| {
            path == entry
                || (path.ends_with(entry.as_str()) && {
                    let rest = &path[..path.len() - entry.len()];
                    rest.ends_with('/') || entry.starts_with('/')
                })
        })
    }
}

/// Reaction to a non-success response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Not an auth concern; the error goes to the caller.
    Pass,
    /// Token expired; refresh once and replay.
    Refresh,
    /// Clear the session and hand the error to the caller.
    Logout,
}

/// Classification of responses and requests for the auth layer.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    public: PublicEndpoints,
    on_forbidden: ForbiddenPolicy,
}

impl AuthPolicy {
    pub fn new(public: PublicEndpoints, on_forbidden: ForbiddenPolicy) -> Self {
        Self {
            public,
            on_forbidden,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            PublicEndpoints::new(config.public_endpoints.iter().cloned()),
            config.on_forbidden,
        )
    }

    /// True if the request may be sent without a token.
    pub fn is_public(&self, url: &Url) -> bool {
        self.public.contains(url)
    }

    pub fn classify(&self, status: StatusCode) -> AuthAction {
        match status {
            StatusCode::UNAUTHORIZED => AuthAction::Refresh,
            StatusCode::FORBIDDEN => match self.on_forbidden {
                ForbiddenPolicy::Propagate => AuthAction::Pass,
                ForbiddenPolicy::Refresh => AuthAction::Refresh,
                ForbiddenPolicy::Logout => AuthAction::Logout,
            },
            _ => AuthAction::Pass,
        }
    }
}
