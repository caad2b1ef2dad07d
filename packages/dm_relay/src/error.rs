use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Failure of a single REST request.
///
/// Every variant renders as `{"message": ...}`; clients only distinguish
/// success from failure.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} is required !")]
    MissingField(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("username taken !")]
    UsernameTaken,

    #[error("user not found !")]
    UserNotFound,

    #[error("password not correct !")]
    WrongPassword,

    /// Collaborator (database, hasher) failure. Detail is logged, not returned.
    #[error("{context}")]
    Internal {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn internal(context: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            context,
            source: source.into(),
        }
    }
}

/// Reject an absent or blank required field.
pub fn require<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::MissingField(field)),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Internal { context, source } => {
                error!("{}: {:#}", context, source);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}
