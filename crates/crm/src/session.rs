//! Connect-or-authenticate flow against amoCRM.
//!
//! With a usable token on file the manager hands back a [`CrmApi`] bound to
//! it. Without one it either starts the authorization-code flow (redirect
//! or connect button) or, when the request is the OAuth callback, exchanges
//! the code and stores the resulting token.

use std::sync::Arc;

use leadsync_core::credential::CredentialRecord;
use serde::Deserialize;

use crate::api::CrmApi;
use crate::config::CrmConfig;
use crate::error::CrmError;
use crate::oauth::OAuthClient;
use crate::state_store::OAuthStateStore;
use crate::token_store::TokenStore;

/// Query parameters relevant to the OAuth flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectParams {
    /// Authorization code from the amoCRM callback.
    pub code: Option<String>,
    /// Anti-forgery value echoed back by amoCRM.
    pub state: Option<String>,
    /// Account domain reported by amoCRM on the callback. Only domains
    /// accepted by [`CrmConfig::is_allowed_domain`] are used.
    pub referer: Option<String>,
    /// When present, answer with the connect button instead of a redirect.
    pub button: Option<String>,
}

/// Outcome of [`SessionManager::connect`].
#[derive(Debug)]
pub enum Connection {
    /// A token is installed; the request may proceed.
    Authenticated(CrmApi),
    /// Send the user to this authorize URL and stop.
    Redirect(String),
    /// Return this button markup and stop.
    Button(String),
}

pub struct SessionManager {
    config: Arc<CrmConfig>,
    http: reqwest::Client,
    oauth: OAuthClient,
    store: TokenStore,
    states: Arc<OAuthStateStore>,
}

impl SessionManager {
    pub fn new(config: Arc<CrmConfig>, http: reqwest::Client, states: Arc<OAuthStateStore>) -> Self {
        let oauth = OAuthClient::new(http.clone(), Arc::clone(&config));
        let store = TokenStore::new(config.token_file.clone());
        Self {
            config,
            http,
            oauth,
            store,
            states,
        }
    }

    /// Produce an authenticated API client, or the response that moves the
    /// user along the authorization flow.
    pub async fn connect(&self, params: &ConnectParams) -> Result<Connection, CrmError> {
        if let Some(record) = self.store.load().await {
            let record = self.ensure_fresh(record).await?;
            return Ok(Connection::Authenticated(self.install(&record)));
        }

        let Some(code) = non_empty(&params.code) else {
            return self.begin_authorization(params.button.is_some()).await;
        };

        let base_domain = match non_empty(&params.referer) {
            Some(referer) if !self.config.is_allowed_domain(referer) => {
                tracing::warn!(%referer, "OAuth callback names a domain outside the allowlist");
                return Err(CrmError::InvalidState);
            }
            Some(referer) => referer,
            None => self.config.auth_domain.as_str(),
        };

        let Some(state) = non_empty(&params.state) else {
            tracing::warn!("OAuth callback without state");
            return Err(CrmError::InvalidState);
        };
        if !self.states.consume(state).await {
            tracing::warn!("OAuth callback with unknown or expired state");
            return Err(CrmError::InvalidState);
        }

        let record = self.oauth.exchange_code(base_domain, code).await?;
        if record.is_expired() {
            return Err(CrmError::AuthExchangeFailed(
                "Issued access token is already expired".into(),
            ));
        }

        self.store.save(&record).await?;
        tracing::info!(base_domain = %record.base_domain, "amoCRM authorization completed");

        Ok(Connection::Authenticated(self.install(&record)))
    }

    async fn begin_authorization(&self, as_button: bool) -> Result<Connection, CrmError> {
        let state = self.states.issue().await;
        if as_button {
            tracing::debug!("Rendering amoCRM connect button");
            Ok(Connection::Button(self.oauth.button_html(&state)))
        } else {
            let url = self.oauth.authorize_url(&state)?;
            tracing::debug!(%url, "Redirecting to amoCRM authorization");
            Ok(Connection::Redirect(url))
        }
    }

    /// Expired tokens are installed unchanged unless eager refresh is on.
    async fn ensure_fresh(&self, record: CredentialRecord) -> Result<CredentialRecord, CrmError> {
        if !record.is_expired() {
            return Ok(record);
        }
        if !self.config.eager_refresh {
            tracing::debug!(expires = record.expires, "Using expired access token as stored");
            return Ok(record);
        }

        tracing::info!(base_domain = %record.base_domain, "Refreshing expired access token");
        let refreshed = self.oauth.refresh(&record).await?;
        self.store.save(&refreshed).await?;
        Ok(refreshed)
    }

    fn install(&self, record: &CredentialRecord) -> CrmApi {
        CrmApi::new(
            self.http.clone(),
            &self.config,
            &record.base_domain,
            &record.access_token,
        )
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
