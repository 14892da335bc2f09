//! The persisted OAuth credential for the connected amoCRM account.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Access/refresh token pair plus the account domain it was issued for.
///
/// Serialized with the camelCase keys used by the token file
/// (`accessToken`, `refreshToken`, `expires`, `baseDomain`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry as a UNIX timestamp in seconds.
    pub expires: i64,
    /// Account domain, e.g. `example.amocrm.ru`.
    pub base_domain: String,
}

impl CredentialRecord {
    /// Reject records with any empty string field.
    ///
    /// A record that fails validation must be treated as absent.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("accessToken", &self.access_token),
            ("refreshToken", &self.refresh_token),
            ("baseDomain", &self.base_domain),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Whether the access token has expired at the given UNIX time.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}
