//! Lead ingestion: connect to amoCRM, fetch leads, upsert them, render.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use leadsync_core::lead::{serialize_custom_fields, Lead};
use leadsync_crm::{ConnectParams, Connection, SessionManager};
use leadsync_db::models::lead::UpsertLead;
use leadsync_db::repositories::LeadRepo;
use leadsync_db::DbPool;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::view;

/// Result of running the ingestion flow for one request.
pub enum Ingestion {
    /// The OAuth flow took over the response (redirect or connect button).
    Halted(Response),
    /// Leads were fetched and stored.
    Fetched(Vec<Lead>),
}

/// Connect, fetch the first page of leads and upsert each by name.
///
/// Every lead is written on every call, whether or not it changed in amoCRM.
pub async fn ingest(state: &AppState, params: &ConnectParams) -> AppResult<Ingestion> {
    let session = SessionManager::new(
        Arc::clone(&state.config.crm),
        state.http.clone(),
        Arc::clone(&state.oauth_states),
    );

    let api = match session.connect(params).await? {
        Connection::Authenticated(api) => api,
        Connection::Redirect(url) => {
            return Ok(Ingestion::Halted(Redirect::to(&url).into_response()));
        }
        Connection::Button(markup) => {
            return Ok(Ingestion::Halted(Html(markup).into_response()));
        }
    };

    let leads = api.list_leads().await?;
    for lead in &leads {
        store_lead(&state.pool, lead).await?;
    }

    tracing::info!(count = leads.len(), base_domain = %api.base_domain(), "Leads ingested");
    Ok(Ingestion::Fetched(leads))
}

async fn store_lead(pool: &DbPool, lead: &Lead) -> AppResult<()> {
    for field in lead.fields_without_values() {
        tracing::warn!(lead = %lead.name, field, "Custom field has no values, skipped");
    }

    let input = UpsertLead {
        name: lead.name.clone(),
        price: lead.price,
        responsible_user_id: lead.responsible_user_id,
        custom_fields_values: serialize_custom_fields(&lead.custom_field_map())?,
        account_id: lead.account_id,
    };
    LeadRepo::upsert_by_name(pool, &input).await?;
    Ok(())
}

/// GET /
///
/// Runs the ingestion flow and renders the fetched leads as HTML.
pub async fn homepage(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> AppResult<Response> {
    match ingest(&state, &params).await? {
        Ingestion::Halted(response) => Ok(response),
        Ingestion::Fetched(leads) => Ok(Html(view::render_leads_page(&leads)).into_response()),
    }
}

/// GET /api/v1/leads
///
/// Same flow as [`homepage`], answering with `{ "data": [lead, ...] }`.
pub async fn list_leads(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> AppResult<Response> {
    match ingest(&state, &params).await? {
        Ingestion::Halted(response) => Ok(response),
        Ingestion::Fetched(leads) => Ok(Json(DataResponse { data: leads }).into_response()),
    }
}
