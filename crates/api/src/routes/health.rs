//! `GET /health`: liveness of the service, its database and its amoCRM link.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use leadsync_crm::TokenStore;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthReport {
    /// `ok` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// A usable amoCRM token is on file. Its absence only means the next
    /// visit to `/` starts authorization, so it does not degrade `status`.
    pub crm_connected: bool,
}

async fn report(State(state): State<AppState>) -> Json<HealthReport> {
    let db_healthy = leadsync_db::health_check(&state.pool).await.is_ok();
    let crm_connected = TokenStore::new(state.config.crm.token_file.clone())
        .load()
        .await
        .is_some();

    Json(HealthReport {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        crm_connected,
    })
}

/// Root-level health route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(report))
}
