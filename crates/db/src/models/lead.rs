//! Stored lead projection and its upsert DTO.

use leadsync_core::types::{CrmId, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `leads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeadRecord {
    pub id: DbId,
    pub name: String,
    pub price: Option<i64>,
    pub responsible_user_id: Option<CrmId>,
    /// JSON object of custom field name to first value.
    pub custom_fields_values: String,
    pub account_id: Option<CrmId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or overwriting the lead with a given name.
#[derive(Debug, Clone)]
pub struct UpsertLead {
    pub name: String,
    pub price: Option<i64>,
    pub responsible_user_id: Option<CrmId>,
    pub custom_fields_values: String,
    pub account_id: Option<CrmId>,
}
