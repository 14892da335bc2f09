use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leadsync_core::error::CoreError;
use leadsync_crm::CrmError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Every failure of the ingestion flow ends up here and is turned into a
/// plain `{ "error", "code" }` JSON response. Nothing is retried and no page
/// is rendered once an error has occurred.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `leadsync_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure talking to amoCRM or managing its token.
    #[error(transparent)]
    Crm(#[from] CrmError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Crm(crm) => classify_crm_error(crm),

            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal_error()
                }
            },

            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                internal_error()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map each amoCRM failure kind to its user-facing response.
fn classify_crm_error(err: &CrmError) -> (StatusCode, &'static str, String) {
    match err {
        CrmError::InvalidState => (
            StatusCode::BAD_REQUEST,
            "INVALID_STATE",
            "Invalid state".to_string(),
        ),
        CrmError::AuthExchangeFailed(detail) => {
            tracing::error!(error = %detail, "amoCRM token exchange failed");
            (
                StatusCode::BAD_GATEWAY,
                "AUTH_EXCHANGE_FAILED",
                "Authorization with amoCRM failed".to_string(),
            )
        }
        CrmError::NoContent => (
            StatusCode::NOT_FOUND,
            "NO_CONTENT",
            "You have no leads.".to_string(),
        ),
        CrmError::HttpClientError(detail) => {
            tracing::error!(error = %detail, "amoCRM request failed");
            (
                StatusCode::BAD_GATEWAY,
                "HTTP_CLIENT_ERROR",
                "An HTTP client error occurred.".to_string(),
            )
        }
        CrmError::UnknownError(detail) => {
            tracing::error!(error = %detail, "Unknown amoCRM error");
            unknown_error()
        }
        CrmError::TokenStore(store_err) => {
            tracing::error!(error = %store_err, "Token store error");
            unknown_error()
        }
    }
}

fn unknown_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "UNKNOWN_ERROR",
        "An unknown error occurred.".to_string(),
    )
}

fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
