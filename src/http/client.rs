//! Authenticated REST client.
//!
//! # Responsibilities
//! - Decorate every request (origin header, bearer token, request id)
//! - Refuse protected calls when logged out, before anything is sent
//! - Recover from token expiry: one refresh, one replay
//! - Abort in-flight calls collectively on cancel
//!
//! # Design Decisions
//! - The session store is injected; the client owns no global state
//! - Each call owns its replay budget (`AuthRetry`); nothing is written
//!   back onto caller-supplied objects
//! - Non-auth failures are never retried
//! - Auth failures on public endpoints (e.g. a wrong password at login) go
//!   straight to the caller; only protected calls trigger a refresh

use futures_util::stream::{self, Stream};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

use crate::auth::{AuthAction, AuthPolicy, Refresher};
use crate::config::loader::ConfigError;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::request::{endpoint_url, ApiRequest, X_REQUEST_ID};
use crate::http::response::{decode_json, error_from_response};
use crate::lifecycle::Canceller;
use crate::listing::{DataSource, ListQuery, Page};
use crate::observability::metrics;
use crate::session::{Session, SessionStore};

/// Login answer from the auth backend.
#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    base_url: Url,
    auth_base_url: Url,
    origin: (HeaderName, HeaderValue),
    policy: AuthPolicy,
    session: Arc<dyn SessionStore>,
    refresher: Refresher,
    canceller: Arc<Canceller>,
}

/// REST client with bearer authentication and single-flight refresh.
///
/// Cheap to clone; clones share the HTTP pool, session and canceller.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Create a client over `session`.
    ///
    /// # Errors
    /// Invalid configuration (URLs, header names, timeouts) or a failure to
    /// build the underlying HTTP client.
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> ClientResult<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .build()?;

        let base_url = parse_url(&config.api.base_url)?;
        let auth_base_url = parse_url(&config.auth_base_url())?;

        let origin_name = HeaderName::from_bytes(config.api.origin_header.as_bytes())
            .map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidHeaderName(
                    config.api.origin_header.clone(),
                )])
            })?;
        let origin_value = HeaderValue::from_str(&config.api.app_origin)?;
        let origin = (origin_name, origin_value);

        let refresh_url = endpoint_url(&auth_base_url, &config.auth.refresh_path)?;
        let refresher = Refresher::new(http.clone(), refresh_url, origin.clone(), session.clone());

        tracing::debug!(
            base_url = %base_url,
            auth_base_url = %auth_base_url,
            on_forbidden = ?config.auth.on_forbidden,
            "API client created"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                policy: AuthPolicy::from_config(&config.auth),
                config,
                base_url,
                auth_base_url,
                origin,
                session,
                refresher,
                canceller: Arc::new(Canceller::new()),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    /// Handle for aborting every in-flight request of this client.
    pub fn canceller(&self) -> Arc<Canceller> {
        self.inner.canceller.clone()
    }

    /// Send `request`, recovering once from an expired token.
    ///
    /// Returns the response only for 2xx statuses. A 401 on a protected
    /// endpoint triggers one refresh; on success the request is replayed
    /// with the new token and the replay's outcome is returned. If the
    /// refresh fails the session is cleared and the original error returned.
    pub async fn execute(&self, request: ApiRequest) -> ClientResult<Response> {
        let inner = &self.inner;
        let url = request.resolve(&inner.base_url)?;
        let public = inner.policy.is_public(&url);
        let request_id = Uuid::new_v4().to_string();
        let method = request.method.as_str().to_string();
        let mut cancel = inner.canceller.token();
        let mut retry = request.auth_retry;
        // Error of the first attempt, held while its replay is pending.
        let mut original: Option<ClientError> = None;

        loop {
            let sent_token = inner.session.current().map(|s| s.token);
            if sent_token.is_none() && !public {
                if let Some(error) = original.take() {
                    tracing::info!(
                        request_id = %request_id,
                        "Session cleared before replay"
                    );
                    return Err(error);
                }
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %url.path(),
                    "Rejecting request without session token"
                );
                metrics::record_rejected("missing_token");
                return Err(ClientError::MissingToken {
                    path: url.path().to_string(),
                });
            }

            let builder = self.build(&request, &url, &request_id, sent_token.as_deref());
            let start = Instant::now();
            let response = match cancel.run(builder.send()).await {
                Some(result) => result?,
                None => return Err(cancelled(&request_id)),
            };

            let status = response.status();
            metrics::record_request(&method, status.as_u16(), start);
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %url.path(),
                status = status.as_u16(),
                "Response received"
            );

            if status.is_success() {
                return Ok(response);
            }

            let error = error_from_response(response).await;
            let action = if public {
                AuthAction::Pass
            } else {
                inner.policy.classify(status)
            };

            match action {
                AuthAction::Refresh if retry.claim() => {
                    tracing::info!(
                        request_id = %request_id,
                        status = status.as_u16(),
                        "Session token rejected, refreshing"
                    );
                    match cancel.run(inner.refresher.refresh(sent_token.as_deref())).await {
                        Some(Ok(_)) => {
                            original = Some(error);
                            continue;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                request_id = %request_id,
                                refresh_error = %e,
                                "Refresh failed"
                            );
                            return Err(error);
                        }
                        None => return Err(cancelled(&request_id)),
                    }
                }
                AuthAction::Logout => {
                    tracing::info!(
                        request_id = %request_id,
                        status = status.as_u16(),
                        "Forbidden, clearing session"
                    );
                    inner.session.clear();
                    return Err(error);
                }
                _ => return Err(error),
            }
        }
    }

    fn build(
        &self,
        request: &ApiRequest,
        url: &Url,
        request_id: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let inner = &self.inner;
        let mut builder = inner
            .http
            .request(request.method.clone(), url.clone())
            .header(inner.origin.0.clone(), inner.origin.1.clone())
            .header(X_REQUEST_ID, request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    /// Execute and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = self.execute(request).await?;
        decode_json(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::patch(path).json(body)?).await
    }

    /// DELETE, discarding any response body.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    /// Log in against `<auth-base><login_path>` and store the session.
    pub async fn login<B: Serialize + ?Sized>(&self, credentials: &B) -> ClientResult<Session> {
        let url = endpoint_url(&self.inner.auth_base_url, &self.inner.config.auth.login_path)?;
        let body: LoginResponse = self
            .send_json(ApiRequest::post(url.as_str()).json(credentials)?)
            .await?;

        let session = Session {
            token: body.token,
            refresh_token: body.refresh_token,
        };
        self.inner.session.replace(session.clone());
        tracing::info!("Logged in");
        Ok(session)
    }

    /// Clear the session and abort everything in flight.
    pub fn logout(&self) {
        self.inner.session.clear();
        self.inner.canceller.cancel_all();
        tracing::info!("Logged out");
    }

    /// Fetch one page of a remote list.
    pub async fn list<T: DeserializeOwned>(
        &self,
        source: impl Into<DataSource>,
        query: &ListQuery,
    ) -> ClientResult<Page<T>> {
        let request = source.into().request(query, &self.inner.config.listing);
        self.send_json(request).await
    }

    /// Stream successive pages starting at `query`, stopping after the last
    /// page, the first error, or a page number that fails to advance.
    pub fn pages<T>(
        &self,
        source: impl Into<DataSource>,
        query: ListQuery,
    ) -> impl Stream<Item = ClientResult<Page<T>>>
    where
        T: DeserializeOwned,
    {
        let client = self.clone();
        let source = source.into();
        stream::unfold(Some((query, None::<u32>)), move |state| {
            let client = client.clone();
            let source = source.clone();
            async move {
                let (query, previous) = state?;
                match client.list::<T>(source, &query).await {
                    Ok(page) => {
                        let current = page.page.or(query.page).unwrap_or(1);
                        if previous.is_some_and(|previous| current <= previous) {
                            tracing::warn!(
                                page = current,
                                previous = ?previous,
                                "Backend did not advance the page, stopping"
                            );
                            return None;
                        }
                        let next = page
                            .has_next()
                            .then(|| query.next_page(current))
                            .flatten()
                            .map(|next| (next, Some(current)));
                        Some((Ok(page), next))
                    }
                    Err(e) => Some((Err(e), None)),
                }
            }
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("auth_base_url", &self.inner.auth_base_url.as_str())
            .field("logged_in", &self.inner.session.current().is_some())
            .finish()
    }
}

fn parse_url(value: &str) -> ClientResult<Url> {
    Url::parse(value).map_err(|source| ClientError::InvalidUrl {
        path: value.to_string(),
        source,
    })
}

fn cancelled(request_id: &str) -> ClientError {
    tracing::debug!(request_id = %request_id, "Request cancelled");
    metrics::record_rejected("cancelled");
    ClientError::Cancelled
}
