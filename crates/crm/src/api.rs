//! REST client for the amoCRM v4 API.
//!
//! Only the first page of `GET /api/v4/leads` is used.

use leadsync_core::lead::Lead;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::CrmConfig;
use crate::error::CrmError;

/// Envelope of `GET /api/v4/leads`.
#[derive(Debug, Deserialize)]
struct LeadsPage {
    #[serde(rename = "_embedded", default)]
    embedded: Option<EmbeddedLeads>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedLeads {
    #[serde(default)]
    leads: Vec<Lead>,
}

/// HTTP client bound to one account and bearer token.
#[derive(Debug, Clone)]
pub struct CrmApi {
    client: reqwest::Client,
    base_url: String,
    base_domain: String,
    access_token: String,
}

impl CrmApi {
    /// Bind a client to `base_domain` with the given access token.
    pub fn new(
        client: reqwest::Client,
        config: &CrmConfig,
        base_domain: &str,
        access_token: &str,
    ) -> Self {
        Self {
            client,
            base_url: config.url(base_domain, ""),
            base_domain: base_domain.to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Fetch the first page of leads.
    ///
    /// An account without leads is reported as [`CrmError::NoContent`]
    /// rather than as an empty list.
    pub async fn list_leads(&self) -> Result<Vec<Lead>, CrmError> {
        let url = format!("{}/api/v4/leads", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| CrmError::HttpClientError(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(CrmError::NoContent);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CrmError::HttpClientError(format!(
                "amoCRM returned HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let page: LeadsPage = response
            .json()
            .await
            .map_err(|e| CrmError::UnknownError(format!("Undecodable leads response: {e}")))?;

        let leads = page.embedded.map(|e| e.leads).unwrap_or_default();
        if leads.is_empty() {
            return Err(CrmError::NoContent);
        }

        tracing::debug!(count = leads.len(), base_domain = %self.base_domain, "Fetched leads");
        Ok(leads)
    }
}
