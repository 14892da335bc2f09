//! Route definitions for the leads page and its JSON mirror.

use axum::routing::get;
use axum::Router;

use crate::handlers::leads;
use crate::state::AppState;

/// Root-level page routes.
///
/// ```text
/// GET /         -> homepage (also the OAuth redirect URI)
/// ```
pub fn page_router() -> Router<AppState> {
    Router::new().route("/", get(leads::homepage))
}

/// Routes mounted under `/api/v1`.
///
/// ```text
/// GET /leads    -> list_leads
/// ```
pub fn api_router() -> Router<AppState> {
    Router::new().route("/leads", get(leads::list_leads))
}
