/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifiers assigned by amoCRM (leads, users, accounts, custom fields).
pub type CrmId = i64;
