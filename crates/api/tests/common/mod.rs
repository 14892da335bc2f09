#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get as route_get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use leadsync_api::config::ServerConfig;
use leadsync_api::router::build_app_router;
use leadsync_api::state::AppState;
use leadsync_crm::CrmConfig;

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults around `crm`.
pub fn test_config(crm: CrmConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        crm: Arc::new(crm),
    }
}

/// Build the full application router, with all middleware layers, the way
/// the binary does.
pub fn build_test_app(pool: PgPool, crm: CrmConfig) -> Router {
    let config = test_config(crm);
    let state = AppState::new(pool, config.clone(), reqwest::Client::new());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fake amoCRM
// ---------------------------------------------------------------------------

/// Serves `/oauth2/access_token` and `/api/v4/leads` with canned bodies.
pub struct FakeAmo {
    pub addr: SocketAddr,
    token_requests: Arc<AtomicUsize>,
    lead_requests: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct FakeState {
    leads_status: StatusCode,
    leads_body: Value,
    token_requests: Arc<AtomicUsize>,
    lead_requests: Arc<AtomicUsize>,
}

impl FakeAmo {
    /// Answer the leads endpoint with `leads` (204 when empty).
    pub async fn with_leads(leads: Value) -> Self {
        let empty = leads.as_array().is_some_and(|l| l.is_empty());
        let status = if empty { StatusCode::NO_CONTENT } else { StatusCode::OK };
        Self::start(status, json!({ "_embedded": { "leads": leads } })).await
    }

    pub async fn start(leads_status: StatusCode, leads_body: Value) -> Self {
        let token_requests = Arc::new(AtomicUsize::new(0));
        let lead_requests = Arc::new(AtomicUsize::new(0));
        let state = FakeState {
            leads_status,
            leads_body,
            token_requests: Arc::clone(&token_requests),
            lead_requests: Arc::clone(&lead_requests),
        };

        let app = Router::new()
            .route("/oauth2/access_token", post(access_token))
            .route("/api/v4/leads", route_get(leads))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            token_requests,
            lead_requests,
        }
    }

    pub fn domain(&self) -> String {
        self.addr.to_string()
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub fn lead_requests(&self) -> usize {
        self.lead_requests.load(Ordering::SeqCst)
    }

    pub fn crm_config(&self, token_file: PathBuf) -> CrmConfig {
        CrmConfig {
            client_id: "client-123".into(),
            client_secret: "secret-456".into(),
            redirect_uri: "https://app.example.com/".into(),
            auth_domain: self.domain(),
            scheme: "http".into(),
            token_file,
            eager_refresh: false,
            state_ttl_secs: 600,
            allowed_domains: vec![self.domain()],
        }
    }
}

async fn access_token(State(state): State<FakeState>) -> Json<Value> {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "token_type": "Bearer",
        "expires_in": 86400,
        "access_token": "fresh-access",
        "refresh_token": "fresh-refresh",
    }))
}

async fn leads(State(state): State<FakeState>) -> Response {
    state.lead_requests.fetch_add(1, Ordering::SeqCst);
    if state.leads_status == StatusCode::NO_CONTENT {
        return StatusCode::NO_CONTENT.into_response();
    }
    (state.leads_status, Json(state.leads_body.clone())).into_response()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn lead_json(name: &str, price: i64, phones: &[&str]) -> Value {
    let custom_fields = if phones.is_empty() {
        Value::Null
    } else {
        let values: Vec<Value> = phones.iter().map(|p| json!({ "value": p })).collect();
        json!([{ "field_id": 3, "field_name": "Phone", "values": values }])
    };
    json!({
        "id": 1000 + price,
        "name": name,
        "price": price,
        "responsible_user_id": 504141,
        "account_id": 28805383,
        "custom_fields_values": custom_fields,
    })
}

/// Write a valid, unexpired token for `domain` into `path`.
pub async fn write_token(path: &std::path::Path, domain: &str) {
    let expires = unix_now() + 3600;
    let body = json!({
        "accessToken": "stored-access",
        "refreshToken": "stored-refresh",
        "expires": expires,
        "baseDomain": domain,
    });
    tokio::fs::write(path, body.to_string()).await.unwrap();
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}
