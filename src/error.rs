//! Error kinds shared across the publishing engine

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by every operation in the engine.
///
/// Storage-layer detail stays inside [`ProfileError::Internal`] and is
/// logged, never serialized into a response body.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("rate limited")]
    RateLimited { retry_after: Duration },

    #[error("internal error")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProfileError {
    pub fn internal<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        error!("storage failure during {}: {}", operation, source);
        ProfileError::Internal(Box::new(source))
    }

    fn status(&self) -> StatusCode {
        match self {
            ProfileError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProfileError::Validation(_) => StatusCode::BAD_REQUEST,
            ProfileError::NotFound(_) => StatusCode::NOT_FOUND,
            ProfileError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProfileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Never leak the storage detail to callers
            ProfileError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));

        if let ProfileError::RateLimited { retry_after } = &self {
            let seconds = retry_after.as_secs().max(1);
            return (
                status,
                [(header::RETRY_AFTER, seconds.to_string())],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}
