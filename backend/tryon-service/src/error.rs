/// Error types for the try-on service
///
/// Every failure path maps to one variant, and every variant maps to a
/// distinct HTTP status and machine-readable code. Internal details are
/// logged server-side and never returned to the caller.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::jwt::JwtError;
use thiserror::Error;

/// Result type for try-on service operations
pub type Result<T> = std::result::Result<T, TryOnError>;

#[derive(Debug, Error)]
pub enum TryOnError {
    /// Missing or malformed request fields
    #[error("{0}")]
    InvalidArgument(String),

    /// Bad signature, unknown or inactive session, malformed token
    #[error("{0}")]
    AuthenticationFailure(String),

    /// Session is past its expiry instant
    #[error("Session has expired")]
    Expired,

    /// Usage counter is at the session limit
    #[error("AI usage limit reached for this session")]
    QuotaExhausted,

    /// Referenced salon, style or session does not exist
    #[error("{0}")]
    NotFound(String),

    /// Storage, cache or signing failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Auth provider, payment processor or image API failure
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl TryOnError {
    pub fn code(&self) -> &'static str {
        match self {
            TryOnError::InvalidArgument(_) => "INVALID_ARGUMENT",
            TryOnError::AuthenticationFailure(_) => "AUTHENTICATION_FAILED",
            TryOnError::Expired => "SESSION_EXPIRED",
            TryOnError::QuotaExhausted => "QUOTA_EXHAUSTED",
            TryOnError::NotFound(_) => "NOT_FOUND",
            TryOnError::Internal(_) => "INTERNAL_ERROR",
            TryOnError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }

    /// Message safe to show to end users
    pub fn public_message(&self) -> String {
        match self {
            TryOnError::Internal(_) => "Internal server error".to_string(),
            TryOnError::Upstream(_) => "Upstream service unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for TryOnError {
    fn status_code(&self) -> StatusCode {
        match self {
            TryOnError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            TryOnError::AuthenticationFailure(_) | TryOnError::Expired => StatusCode::UNAUTHORIZED,
            TryOnError::QuotaExhausted => StatusCode::TOO_MANY_REQUESTS,
            TryOnError::NotFound(_) => StatusCode::NOT_FOUND,
            TryOnError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TryOnError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            TryOnError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
            }
            TryOnError::Upstream(detail) => {
                tracing::warn!(error = %detail, "Upstream call failed");
            }
            _ => {}
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.public_message(),
            "code": self.code(),
            "status": status.as_u16(),
        }))
    }
}

impl From<sqlx::Error> for TryOnError {
    fn from(err: sqlx::Error) -> Self {
        TryOnError::Internal(format!("database: {err}"))
    }
}

impl From<redis::RedisError> for TryOnError {
    fn from(err: redis::RedisError) -> Self {
        TryOnError::Internal(format!("redis: {err}"))
    }
}

impl From<reqwest::Error> for TryOnError {
    fn from(err: reqwest::Error) -> Self {
        TryOnError::Upstream(err.to_string())
    }
}

impl From<validator::ValidationErrors> for TryOnError {
    fn from(err: validator::ValidationErrors) -> Self {
        TryOnError::InvalidArgument(err.to_string())
    }
}

impl From<JwtError> for TryOnError {
    /// Token verification failures; signing failures are internal
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => TryOnError::Expired,
            JwtError::InvalidKey(e) | JwtError::Signing(e) => TryOnError::Internal(e),
            JwtError::InvalidSignature | JwtError::InvalidAudience | JwtError::Malformed(_) => {
                TryOnError::AuthenticationFailure("Invalid session token".to_string())
            }
        }
    }
}
