//! Repository for the `leads` table.

use sqlx::PgPool;

use crate::models::lead::{LeadRecord, UpsertLead};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, price, responsible_user_id, custom_fields_values, \
                       account_id, created_at, updated_at";

/// Lead persistence keyed by `name`.
pub struct LeadRepo;

impl LeadRepo {
    /// Create the lead named `input.name`, or overwrite every attribute of
    /// the existing one.
    pub async fn upsert_by_name(pool: &PgPool, input: &UpsertLead) -> Result<LeadRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO leads (name, price, responsible_user_id, custom_fields_values, account_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (name)
             DO UPDATE SET
                price = EXCLUDED.price,
                responsible_user_id = EXCLUDED.responsible_user_id,
                custom_fields_values = EXCLUDED.custom_fields_values,
                account_id = EXCLUDED.account_id,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, LeadRecord>(&query)
            .bind(&input.name)
            .bind(input.price)
            .bind(input.responsible_user_id)
            .bind(&input.custom_fields_values)
            .bind(input.account_id)
            .fetch_one(pool)
            .await?;

        tracing::debug!(lead_id = record.id, name = %record.name, "Lead upserted");
        Ok(record)
    }

    /// Find a lead by its name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<LeadRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads WHERE name = $1");
        sqlx::query_as::<_, LeadRecord>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all stored leads ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<LeadRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads ORDER BY name ASC");
        sqlx::query_as::<_, LeadRecord>(&query).fetch_all(pool).await
    }

    /// Count stored leads.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
