//! Outbound request description.
//!
//! # Responsibilities
//! - Describe a call independently of any one transmission
//! - Resolve endpoint paths against the API base
//! - Carry the request's own refresh-and-replay budget
//!
//! # Design Decisions
//! - Bodies are kept as JSON values so the replay rebuilds an identical call
//! - Absolute URLs pass through untouched (auth base, other services)

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::AuthRetry;
use crate::error::{ClientError, ClientResult};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// A REST call, replayable.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) auth_retry: AuthRetry,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth_retry: AuthRetry::once(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters.
    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Disable refresh-and-replay for this request: a 401 goes straight to
    /// the caller.
    pub fn no_auth_retry(mut self) -> Self {
        self.auth_retry = AuthRetry::spent();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve the endpoint against `base`.
    ///
    /// Relative paths are appended to the base path (`Url::join` would drop
    /// the base path for `/account`).
    pub fn resolve(&self, base: &Url) -> ClientResult<Url> {
        endpoint_url(base, &self.path)
    }
}

/// Append `path` to `base`, or parse it as-is when it is already absolute.
pub fn endpoint_url(base: &Url, path: &str) -> ClientResult<Url> {
    let invalid = |source| ClientError::InvalidUrl {
        path: path.to_string(),
        source,
    };

    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path).map_err(invalid);
    }

    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(invalid)
}
