use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid identity id: {0}")]
    InvalidIdentity(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing or invalid API token")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Batch too large: {size} records (max {max})")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Collection storage error: {0}")]
    Storage(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::InvalidIdentity(_) | ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BatchTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::Storage(e) => {
                tracing::error!(error = %e, "collection storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Collection storage error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
