//! Shared utilities for integration testing: a programmable mock backend.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use backoffice_client::{ApiClient, ClientConfig, SessionStore};

pub const PAGE_SIZE: usize = 10;
pub const ACCOUNT_COUNT: usize = 25;
pub const PASSWORD: &str = "secret";

/// Observable state of the mock backend.
#[derive(Default)]
pub struct MockState {
    access: Mutex<String>,
    refresh: Mutex<String>,
    rotations: Mutex<VecDeque<(String, String)>>,
    pub refresh_calls: AtomicU32,
    pub login_calls: AtomicU32,
    pub protected_calls: AtomicU32,
    pub refresh_fails: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    seen_auth: Mutex<Vec<Option<String>>>,
    seen_origin: Mutex<Vec<Option<String>>>,
    seen_request_ids: Mutex<Vec<Option<String>>>,
    seen_refresh_tokens: Mutex<Vec<String>>,
    seen_login_auth: Mutex<Vec<Option<String>>>,
}

impl MockState {
    /// Authorization headers seen by protected endpoints, in order.
    pub fn seen_auth(&self) -> Vec<Option<String>> {
        self.seen_auth.lock().unwrap().clone()
    }

    pub fn seen_origin(&self) -> Vec<Option<String>> {
        self.seen_origin.lock().unwrap().clone()
    }

    pub fn seen_request_ids(&self) -> Vec<Option<String>> {
        self.seen_request_ids.lock().unwrap().clone()
    }

    /// Refresh tokens presented to the refresh endpoint, in order.
    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.seen_refresh_tokens.lock().unwrap().clone()
    }

    /// Authorization headers seen by the login endpoint, in order.
    pub fn seen_login_auth(&self) -> Vec<Option<String>> {
        self.seen_login_auth.lock().unwrap().clone()
    }

    /// Token currently accepted by protected endpoints.
    pub fn access_token(&self) -> String {
        self.access.lock().unwrap().clone()
    }

    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_calls(&self) -> u32 {
        self.protected_calls.load(Ordering::SeqCst)
    }

    fn record(&self, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.protected_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_auth.lock().unwrap().push(header("authorization"));
        self.seen_origin.lock().unwrap().push(header("x-app-origin"));
        self.seen_request_ids.lock().unwrap().push(header("x-request-id"));
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let access = self.access.lock().unwrap().clone();
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| !access.is_empty() && token == access)
    }
}

/// A running mock backend.
pub struct MockBackend {
    /// API base URL, e.g. `http://127.0.0.1:41234/api`.
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Start a backend that accepts `access` as the valid bearer token and
    /// `refresh` as the valid refresh token. An empty `access` accepts none.
    pub async fn start(access: &str, refresh: &str) -> Self {
        let state = Arc::new(MockState::default());
        *state.access.lock().unwrap() = access.to_string();
        *state.refresh.lock().unwrap() = refresh.to_string();

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/refresh-token", post(refresh_token))
            .route("/api/account", get(account))
            .route("/api/always-401", get(always_unauthorized))
            .route("/api/forbidden", get(forbidden))
            .route("/api/boom", get(boom))
            .route("/api/slow", get(slow))
            .route("/api/accounts", get(accounts))
            .route("/api/stuck-pages", get(stuck_pages))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    /// Queue the token pair handed out by the next successful refresh.
    pub fn rotate_to(&self, access: &str, refresh: &str) -> &Self {
        self.state
            .rotations
            .lock()
            .unwrap()
            .push_back((access.to_string(), refresh.to_string()));
        self
    }

    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = self.base_url.clone();
        config.timeouts.request_secs = 10;
        config
    }

    pub fn client(&self, session: Arc<dyn SessionStore>) -> ApiClient {
        ApiClient::new(self.config(), session).unwrap()
    }

    pub fn client_with(
        &self,
        session: Arc<dyn SessionStore>,
        tweak: impl FnOnce(&mut ClientConfig),
    ) -> ApiClient {
        let mut config = self.config();
        tweak(&mut config);
        ApiClient::new(config, session).unwrap()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    state.seen_login_auth.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let access = state.access.lock().unwrap().clone();
    let refresh = state.refresh.lock().unwrap().clone();
    Json(json!({ "token": access, "refresh_token": refresh })).into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh_token(State(state): State<Arc<MockState>>, Json(body): Json<RefreshBody>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    state
        .seen_refresh_tokens
        .lock()
        .unwrap()
        .push(body.refresh_token.clone());

    if state.refresh_fails.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Refresh service down");
    }
    if *state.refresh.lock().unwrap() != body.refresh_token {
        return error(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }
    let Some((access, refresh)) = state.rotations.lock().unwrap().pop_front() else {
        return error(StatusCode::UNAUTHORIZED, "Refresh token expired");
    };
    // Rotation is committed before the (slow) answer goes out.
    *state.access.lock().unwrap() = access.clone();
    *state.refresh.lock().unwrap() = refresh.clone();

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    Json(json!({ "token": access, "refresh_token": refresh })).into_response()
}

async fn account(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    if !state.authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }
    Json(json!({ "id": 1, "owner": "ops" })).into_response()
}

async fn always_unauthorized(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    error(StatusCode::UNAUTHORIZED, "Token expired")
}

async fn forbidden(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    error(StatusCode::FORBIDDEN, "Not allowed")
}

async fn boom(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    error(StatusCode::INTERNAL_SERVER_ERROR, "Billing summary unavailable")
}

async fn slow(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "done": true })).into_response()
}

async fn accounts(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record(&headers);
    if !state.authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }

    let search = params.get("search").cloned().unwrap_or_default().to_lowercase();
    let status = params.get("status").cloned();
    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);

    let matching: Vec<Value> = (1..=ACCOUNT_COUNT)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("Account {:02}", i),
                "status": if i % 2 == 0 { "blocked" } else { "active" },
            })
        })
        .filter(|a| {
            a["name"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(&search))
        })
        .filter(|a| status.as_deref().map_or(true, |s| a["status"] == s))
        .collect();

    let last_page = matching.len().div_ceil(PAGE_SIZE).max(1);
    let data: Vec<Value> = matching
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    Json(json!({
        "data": data,
        "total": matching.len(),
        "current_page": page,
        "last_page": last_page,
    }))
    .into_response()
}

/// A list endpoint that ignores the page parameter.
async fn stuck_pages(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    Json(json!({
        "data": [{ "id": 1, "name": "Account 01" }],
        "current_page": 1,
        "last_page": 3,
    }))
    .into_response()
}
