use crate::token_store::TokenStoreError;

/// Failures of the amoCRM connect/fetch flow.
///
/// Every variant ends the current request; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// A callback carried a `code` but no usable `state`.
    #[error("Invalid state")]
    InvalidState,

    /// The authorization server rejected the code (or refresh token).
    #[error("Token exchange failed: {0}")]
    AuthExchangeFailed(String),

    /// The account has no leads.
    #[error("No leads available")]
    NoContent,

    /// Transport failure or non-success status from the API.
    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}
