//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the back-office client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend location and the fixed origin identifier.
    pub api: ApiConfig,

    /// Authentication endpoints and refresh behavior.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Remote list/select parameters.
    pub listing: ListingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    /// Base URL the auth endpoints hang off.
    pub fn auth_base_url(&self) -> String {
        match &self.api.auth_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/auth", self.api.base_url.trim_end_matches('/')),
        }
    }
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// REST API base URL (e.g., "https://admin.example.com/api").
    pub base_url: String,

    /// Auth API base URL. Defaults to `<base_url>/auth`.
    pub auth_base_url: Option<String>,

    /// Name of the origin header sent with every request.
    pub origin_header: String,

    /// Fixed client identifier sent in the origin header.
    pub app_origin: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            auth_base_url: None,
            origin_header: "X-App-Origin".to_string(),
            app_origin: "backoffice-admin".to_string(),
        }
    }
}

/// What a 403 answer does to the session.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenPolicy {
    /// Hand the 403 to the caller untouched.
    #[default]
    Propagate,
    /// Treat like 401: refresh once and replay.
    Refresh,
    /// Clear the session immediately and hand the 403 to the caller.
    Logout,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Endpoints that may be called without a session token.
    pub public_endpoints: Vec<String>,

    /// Login endpoint, relative to the auth base.
    pub login_path: String,

    /// Refresh endpoint, relative to the auth base.
    pub refresh_path: String,

    /// Handling of 403 answers.
    pub on_forbidden: ForbiddenPolicy,

    /// Where the CLI persists the session between runs.
    pub session_file: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_endpoints: vec!["/login".to_string(), "/refresh-token".to_string()],
            login_path: "/login".to_string(),
            refresh_path: "/refresh-token".to_string(),
            on_forbidden: ForbiddenPolicy::Propagate,
            session_file: None,
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Remote listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Query parameter carrying the page number.
    pub page_param: String,

    /// Query parameter carrying the search term.
    pub search_param: String,

    /// Debounce interval for search input in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_param: "page".to_string(),
            search_param: "search".to_string(),
            debounce_ms: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.origin_header, "X-App-Origin");
        assert_eq!(config.auth.on_forbidden, ForbiddenPolicy::Propagate);
        assert_eq!(config.auth.public_endpoints, vec!["/login", "/refresh-token"]);
        assert_eq!(config.listing.debounce_ms, 300);
    }

    #[test]
    fn test_auth_base_url() {
        let mut config = ClientConfig::default();
        config.api.base_url = "https://admin.example.com/api/".into();
        assert_eq!(config.auth_base_url(), "https://admin.example.com/api/auth");

        config.api.auth_base_url = Some("https://sso.example.com/v2/".into());
        assert_eq!(config.auth_base_url(), "https://sso.example.com/v2");
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://pos.example.com/api"

            [auth]
            on_forbidden = "logout"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://pos.example.com/api");
        assert_eq!(config.api.app_origin, "backoffice-admin");
        assert_eq!(config.auth.on_forbidden, ForbiddenPolicy::Logout);
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
