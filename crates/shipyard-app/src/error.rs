use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(shipyard_dal::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<shipyard_dal::Error> for ApiError {
    fn from(error: shipyard_dal::Error) -> Self {
        match error {
            shipyard_dal::Error::RecordNotFound(what) => ApiError::ResourceNotFound(what),
            shipyard_dal::Error::InvalidInput(msg) => ApiError::InvalidInput(msg),
            shipyard_dal::Error::InvalidOrderByField(field) => {
                ApiError::InvalidQuery(format!("Cannot order by {field}"))
            }
            other => ApiError::DatabaseError(other),
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidInput(_) | ApiError::InvalidQuery(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            ApiError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            error!("Request failed: {self}");
            "An internal error occurred".to_string()
        } else {
            debug!("Request rejected: {self}");
            self.to_string()
        };

        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}
