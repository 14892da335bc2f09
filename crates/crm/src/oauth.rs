//! amoCRM authorization server calls: authorize URL, connect button,
//! code exchange and token refresh.

use std::sync::Arc;

use leadsync_core::credential::CredentialRecord;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::CrmConfig;
use crate::error::CrmError;

/// Script served by amoCRM that turns the tag into a connect button.
const BUTTON_SCRIPT_PATH: &str = "/auth/button.min.js";

/// Successful response of `POST /oauth2/access_token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    redirect_uri: &'a str,
}

/// OAuth client for the integration described by [`CrmConfig`].
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: Arc<CrmConfig>,
}

impl OAuthClient {
    pub fn new(http: reqwest::Client, config: Arc<CrmConfig>) -> Self {
        Self { http, config }
    }

    /// Authorize page URL carrying `state` and `mode=post_message`.
    pub fn authorize_url(&self, state: &str) -> Result<String, CrmError> {
        let base = self.config.url(&self.config.auth_domain, "/oauth");
        let url = Url::parse_with_params(
            &base,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("state", state),
                ("mode", "post_message"),
            ],
        )
        .map_err(|e| CrmError::UnknownError(format!("Invalid authorize URL {base}: {e}")))?;
        Ok(url.into())
    }

    /// Embeddable `<script>` tag rendering amoCRM's "install integration"
    /// button for this client and `state`.
    pub fn button_html(&self, state: &str) -> String {
        use html_escape::encode_double_quoted_attribute as attr;

        let src = self.config.url(&self.config.auth_domain, BUTTON_SCRIPT_PATH);
        format!(
            r#"<script class="amocrm_oauth" charset="utf-8" data-client-id="{client_id}" data-title="Установить интеграцию" data-compact="true" data-class-name="className" data-color="default" data-state="{state}" data-error-callback="handleOauthError" data-mode="popup" src="{src}"></script>"#,
            client_id = attr(&self.config.client_id),
            state = attr(state),
            src = attr(&src),
        )
    }

    /// Exchange an authorization `code` for a token pair at `base_domain`.
    pub async fn exchange_code(
        &self,
        base_domain: &str,
        code: &str,
    ) -> Result<CredentialRecord, CrmError> {
        let request = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            grant_type: "authorization_code",
            code: Some(code),
            refresh_token: None,
            redirect_uri: &self.config.redirect_uri,
        };
        self.request_token(base_domain, &request).await
    }

    /// Mint a new token pair from `record`'s refresh token. The base domain
    /// is carried over.
    pub async fn refresh(&self, record: &CredentialRecord) -> Result<CredentialRecord, CrmError> {
        let request = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            grant_type: "refresh_token",
            code: None,
            refresh_token: Some(&record.refresh_token),
            redirect_uri: &self.config.redirect_uri,
        };
        self.request_token(&record.base_domain, &request).await
    }

    async fn request_token(
        &self,
        base_domain: &str,
        request: &TokenRequest<'_>,
    ) -> Result<CredentialRecord, CrmError> {
        let url = self.config.url(base_domain, "/oauth2/access_token");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CrmError::AuthExchangeFailed(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CrmError::AuthExchangeFailed(format!(
                "Token endpoint returned HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CrmError::AuthExchangeFailed(format!("Undecodable token response: {e}")))?;

        Ok(CredentialRecord {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires: chrono::Utc::now().timestamp().saturating_add(token.expires_in),
            base_domain: base_domain.to_string(),
        })
    }
}
