//! Local stand-in for a back-office API, for trying the client by hand.
//!
//! Issues short-lived access tokens so the refresh path is easy to hit:
//!
//! ```text
//! mock-backend --token-ttl-secs 5 &
//! backoffice login -u ops@example.com -p secret
//! sleep 6; backoffice get /account      # refreshed transparently
//! ```

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const PAGE_SIZE: usize = 10;

#[derive(Parser)]
#[command(name = "mock-backend")]
#[command(about = "Mock back-office API with short-lived tokens", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: String,

    /// Access token lifetime
    #[arg(long, default_value_t = 30)]
    token_ttl_secs: u64,
}

struct Tokens {
    access: String,
    refresh: String,
    issued_at: Instant,
}

#[derive(Clone)]
struct AppState {
    tokens: Arc<Mutex<Option<Tokens>>>,
    ttl: Duration,
    accounts: Arc<Vec<Value>>,
}

impl AppState {
    fn issue(&self) -> Value {
        let tokens = Tokens {
            access: Uuid::new_v4().to_string(),
            refresh: Uuid::new_v4().to_string(),
            issued_at: Instant::now(),
        };
        let body = json!({ "token": tokens.access, "refresh_token": tokens.refresh });
        *self.tokens.lock().expect("token mutex poisoned") = Some(tokens);
        body
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let tokens = self.tokens.lock().expect("token mutex poisoned");
        match (bearer, tokens.as_ref()) {
            (Some(bearer), Some(t)) => bearer == t.access && t.issued_at.elapsed() < self.ttl,
            _ => false,
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
    if password.is_empty() {
        return unauthorized("Invalid credentials");
    }
    tracing::info!("Login accepted");
    Json(state.issue()).into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh(State(state): State<AppState>, Json(body): Json<RefreshBody>) -> Response {
    let valid = state
        .tokens
        .lock()
        .expect("token mutex poisoned")
        .as_ref()
        .is_some_and(|t| t.refresh == body.refresh_token);
    if !valid {
        return unauthorized("Invalid refresh token");
    }
    tracing::info!("Token refreshed");
    Json(state.issue()).into_response()
}

async fn account(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized("Token expired");
    }
    Json(json!({ "id": 1, "name": "Operations", "balance": "1250.00" })).into_response()
}

async fn accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized("Token expired");
    }
    let search = params
        .get("search")
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);

    let matching: Vec<&Value> = state
        .accounts
        .iter()
        .filter(|a| {
            a["name"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(&search))
        })
        .collect();
    let last_page = matching.len().div_ceil(PAGE_SIZE).max(1);
    let data: Vec<&Value> = matching
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .copied()
        .collect();

    Json(json!({
        "data": data,
        "total": matching.len(),
        "current_page": page,
        "last_page": last_page,
        "per_page": PAGE_SIZE,
    }))
    .into_response()
}

fn seed_accounts() -> Vec<Value> {
    let names = [
        "Acme Payments", "Globex Cards", "Initech POS", "Umbrella Retail", "Hooli Pay",
        "Stark Ledger", "Wayne Billing", "Wonka Treats", "Cyberdyne Cafe", "Soylent Foods",
        "Tyrell Transit", "Vandelay Imports", "Pied Piper Kiosk", "Aperture Labs Store",
    ];
    names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "id": i + 1, "name": name, "status": "active" }))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_backend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let state = AppState {
        tokens: Arc::new(Mutex::new(None)),
        ttl: Duration::from_secs(args.token_ttl_secs),
        accounts: Arc::new(seed_accounts()),
    };

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh-token", post(refresh))
        .route("/api/account", get(account))
        .route("/api/accounts", get(accounts))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        token_ttl_secs = args.token_ttl_secs,
        "Mock backend listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
