use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use camp_query::TranslateError;
use camp_store::StoreError;
use thiserror::Error;
use tokio::task::JoinError;

pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{resource} not found with id of {id}")]
    NotFound { resource: &'static str, id: String },

    /// A lookup by something other than id found nothing.
    #[error("{0}")]
    NoMatch(String),

    /// A path id that is not a valid ObjectId.
    #[error("Resource not found with id of {0}")]
    BadId(String),

    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Resource already exists with same {0}")]
    Duplicate(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Failures the client cannot act on. The detail is logged, never sent.
    #[error("Server Error")]
    Upstream(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn not_authorized() -> Self {
        ApiError::Unauthorized(NOT_AUTHORIZED.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } | ApiError::NoMatch(_) | ApiError::BadId(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Validation(_) | ApiError::Duplicate(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey { field, .. } => ApiError::Duplicate(field),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(e: TranslateError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        ApiError::Upstream(format!("blocking task failed: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Upstream(detail) => tracing::error!(%detail, "request failed"),
            other => tracing::debug!(status = status.as_u16(), error = %other, "request rejected"),
        }

        let body = serde_json::json!({ "success": false, "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            ApiError::not_found("Bootcamp", "5d725a1b").to_string(),
            "Bootcamp not found with id of 5d725a1b"
        );
        assert_eq!(
            ApiError::Validation(vec!["Please add a name".into(), "Please add a description".into()])
                .to_string(),
            "Please add a name, Please add a description"
        );
        assert_eq!(ApiError::Upstream("disk on fire".into()).to_string(), "Server Error");
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let dup: ApiError = StoreError::DuplicateKey {
            collection: "users".into(),
            field: "email".into(),
        }
        .into();
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
        assert_eq!(dup.to_string(), "Resource already exists with same email");

        let closed: ApiError = StoreError::Closed.into();
        assert_eq!(closed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn translate_errors_are_client_errors() {
        let err: ApiError = TranslateError::Malformed("bad".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
