pub mod health;
pub mod leads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /leads                                           ingest + JSON listing
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(leads::api_router())
}
