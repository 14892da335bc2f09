//! In-process stand-in for the amoCRM token and leads endpoints.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use leadsync_crm::CrmConfig;
use serde_json::{json, Value};

/// Canned responses served by [`FakeAmo`].
pub struct FakeAmoSpec {
    pub token_status: StatusCode,
    pub token_body: Value,
    pub leads_status: StatusCode,
    pub leads_body: String,
}

impl Default for FakeAmoSpec {
    fn default() -> Self {
        Self {
            token_status: StatusCode::OK,
            token_body: token_body("fresh-access", "fresh-refresh", 86_400),
            leads_status: StatusCode::OK,
            leads_body: leads_body(json!([sample_lead("Deal A")])).to_string(),
        }
    }
}

#[derive(Default)]
struct Recorded {
    token_requests: AtomicUsize,
    lead_requests: AtomicUsize,
    last_token_request: Mutex<Option<Value>>,
    last_authorization: Mutex<Option<String>>,
}

struct FakeState {
    spec: FakeAmoSpec,
    recorded: Recorded,
}

pub struct FakeAmo {
    pub addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeAmo {
    pub async fn start(spec: FakeAmoSpec) -> Self {
        let state = Arc::new(FakeState {
            spec,
            recorded: Recorded::default(),
        });

        let app = Router::new()
            .route("/oauth2/access_token", post(access_token))
            .route("/api/v4/leads", get(leads))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// `host:port` usable as an amoCRM base domain.
    pub fn domain(&self) -> String {
        self.addr.to_string()
    }

    pub fn token_requests(&self) -> usize {
        self.state.recorded.token_requests.load(Ordering::SeqCst)
    }

    pub fn lead_requests(&self) -> usize {
        self.state.recorded.lead_requests.load(Ordering::SeqCst)
    }

    pub fn last_token_request(&self) -> Option<Value> {
        self.state.recorded.last_token_request.lock().unwrap().clone()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.recorded.last_authorization.lock().unwrap().clone()
    }

    /// Plain-HTTP config pointing every amoCRM call at this server.
    pub fn config(&self, token_file: PathBuf) -> CrmConfig {
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

async fn access_token(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    state.recorded.token_requests.fetch_add(1, Ordering::SeqCst);
    *state.recorded.last_token_request.lock().unwrap() = Some(body);
    (state.spec.token_status, Json(state.spec.token_body.clone())).into_response()
}

async fn leads(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.recorded.lead_requests.fetch_add(1, Ordering::SeqCst);
    *state.recorded.last_authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if state.spec.leads_status == StatusCode::NO_CONTENT {
        return StatusCode::NO_CONTENT.into_response();
    }
    (
        state.spec.leads_status,
        [("content-type", "application/hal+json")],
        state.spec.leads_body.clone(),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn token_body(access: &str, refresh: &str, expires_in: i64) -> Value {
    json!({
        "token_type": "Bearer",
        "expires_in": expires_in,
        "access_token": access,
        "refresh_token": refresh,
    })
}

pub fn sample_lead(name: &str) -> Value {
    json!({
        "id": 3912171,
        "name": name,
        "price": 12000,
        "responsible_user_id": 504141,
        "group_id": 0,
        "status_id": 143,
        "pipeline_id": 3104455,
        "account_id": 28805383,
        "custom_fields_values": [
            {
                "field_id": 3,
                "field_name": "Phone",
                "field_code": "PHONE",
                "field_type": "multitext",
                "values": [
                    { "value": "123", "enum_id": 1, "enum_code": "WORK" },
                    { "value": "456", "enum_id": 2, "enum_code": "MOB" }
                ]
            }
        ]
    })
}

pub fn leads_body(leads: Value) -> Value {
    json!({
        "_page": 1,
        "_links": { "self": { "href": "https://example.amocrm.ru/api/v4/leads?page=1" } },
        "_embedded": { "leads": leads }
    })
}
