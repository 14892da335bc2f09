//! JSON file holding the single [`CredentialRecord`].
//!
//! Reads fail soft: a missing, empty or malformed file is simply "no
//! token". Writes replace the whole file. There is no locking, so two
//! concurrent writers can overwrite each other.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use leadsync_core::credential::CredentialRecord;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed read/write surface for the credential record.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

/// On-disk shape. `expires` has been seen both as a number and as a
/// numeric string.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredToken {
    access_token: String,
    refresh_token: String,
    expires: Expires,
    base_domain: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Expires {
    Number(i64),
    Text(String),
}

impl Expires {
    fn as_timestamp(&self) -> Option<i64> {
        match self {
            Expires::Number(n) => Some(*n),
            Expires::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record, or `None` when the file is absent, empty,
    /// unparseable, or missing any of the four fields.
    ///
    /// Expiry is not checked here.
    pub async fn load(&self) -> Option<CredentialRecord> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Token file unreadable");
                return None;
            }
        };

        if contents.trim().is_empty() {
            return None;
        }

        let stored: StoredToken = match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Token file is not a credential record");
                return None;
            }
        };

        let record = CredentialRecord {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires: stored.expires.as_timestamp()?,
            base_domain: stored.base_domain,
        };
        record.validate().ok()?;
        Some(record)
    }

    /// Overwrite the file with `record`, creating parent directories.
    pub async fn save(&self, record: &CredentialRecord) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec(record)?;
        tokio::fs::write(&self.path, json).await?;
        tracing::debug!(path = %self.path.display(), "Token file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TokenStore {
        TokenStore::new(dir.path().join("token_info.json"))
    }

    fn record() -> CredentialRecord {
        CredentialRecord {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires: 1_900_000_000,
            base_domain: "acme.amocrm.ru".into(),
        }
    }

    async fn write(store: &TokenStore, contents: &str) {
        tokio::fs::write(store.path(), contents).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().await.is_none());
    }

    #[tokio::test]
    async fn empty_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        write(&store, "").await;
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn garbage_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        write(&store, "not json at all").await;
        assert!(store.load().await.is_none());

        write(&store, "[1, 2, 3]").await;
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn each_missing_field_makes_record_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let full = serde_json::to_value(record()).unwrap();

        for key in ["accessToken", "refreshToken", "expires", "baseDomain"] {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(key);
            write(&store, &partial.to_string()).await;
            assert!(store.load().await.is_none(), "record without {key} must be absent");
        }
    }

    #[tokio::test]
    async fn empty_string_field_makes_record_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        write(
            &store,
            r#"{"accessToken":"","refreshToken":"r","expires":1,"baseDomain":"x.example.com"}"#,
        )
        .await;
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&record()).await.unwrap();
        assert_eq!(store.load().await, Some(record()));
    }

    #[tokio::test]
    async fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&record()).await.unwrap();

        let mut newer = record();
        newer.access_token = "access-2".into();
        newer.expires += 86_400;
        store.save(&newer).await.unwrap();

        assert_eq!(store.load().await, Some(newer));
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested/deeper/token.json"));
        store.save(&record()).await.unwrap();
        assert!(store.load().await.is_some());
    }

    #[tokio::test]
    async fn expired_record_is_still_returned() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        write(
            &store,
            r#"{"accessToken":"a","refreshToken":"r","expires":1000,"baseDomain":"x.example.com"}"#,
        )
        .await;

        let loaded = store.load().await.expect("expired record must still load");
        assert_eq!(loaded.access_token, "a");
        assert_eq!(loaded.refresh_token, "r");
        assert_eq!(loaded.expires, 1000);
        assert_eq!(loaded.base_domain, "x.example.com");
    }

    #[tokio::test]
    async fn numeric_string_expiry_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        write(
            &store,
            r#"{"accessToken":"a","refreshToken":"r","expires":"1700000000","baseDomain":"x.example.com"}"#,
        )
        .await;
        assert_eq!(store.load().await.map(|r| r.expires), Some(1_700_000_000));
    }
}
