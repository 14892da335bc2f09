use std::sync::Arc;

use leadsync_crm::OAuthStateStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: leadsync_db::DbPool,
    /// Server configuration, including the amoCRM integration settings.
    pub config: Arc<ServerConfig>,
    /// Pooled HTTP client for amoCRM calls.
    pub http: reqwest::Client,
    /// OAuth `state` values issued and not yet returned.
    pub oauth_states: Arc<OAuthStateStore>,
}

impl AppState {
    pub fn new(pool: leadsync_db::DbPool, config: ServerConfig, http: reqwest::Client) -> Self {
        let ttl = std::time::Duration::from_secs(config.crm.state_ttl_secs);
        Self {
            pool,
            config: Arc::new(config),
            http,
            oauth_states: Arc::new(OAuthStateStore::new(ttl)),
        }
    }
}
