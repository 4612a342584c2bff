use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that reach the HTTP boundary. Every variant renders as a JSON
/// `{ "error": ... }` body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// `context` is the public message; `source` is only logged.
    #[error("{context}: {source:#}")]
    Internal {
        context: &'static str,
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal { context, source } => {
                tracing::error!("{}: {:#}", context, source);
                context.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Attach the public 500 message to a lower-layer failure.
pub trait ResultExt<T> {
    fn context_500(self, context: &'static str) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for anyhow::Result<T> {
    fn context_500(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|source| AppError::Internal { context, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_hides_source() {
        let err: Result<(), AppError> =
            Err(anyhow::anyhow!("connection refused")).context_500("Failed to delete conversation");
        let err = err.unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn maps_statuses() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("Post").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound("Post").to_string(), "Post not found");
        assert_eq!(
            AppError::Conflict("exists".into()).status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn json_rejection_becomes_bad_request() {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::Request;

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = axum::Json::<serde_json::Value>::from_request(request, &())
            .await
            .err()
            .unwrap();

        let err = AppError::from(rejection);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(!err.to_string().is_empty());
    }
}
