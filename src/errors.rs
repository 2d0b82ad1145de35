use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced across the HTTP boundary. Maps 1:1 onto the
/// `{code, description}` envelope and the 400/401/404/500 status family.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn description(&self) -> String {
        match self {
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                msg.clone()
            }
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "description": self.description(),
            }
        });

        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(body),
            ApiError::Unauthorized(_) => HttpResponse::Unauthorized().json(body),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(body),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let detail = errors
                    .iter()
                    .map(|e| e.message.clone().unwrap_or_default().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{field}: {detail}")
            })
            .collect();
        ApiError::BadRequest(messages.join("; "))
    }
}

/// Errors produced inside a job handler. Never crosses the HTTP boundary;
/// a `Result::Err` here is what `fail()`s a queue lease.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("malformed job payload: {0}")]
    BadPayload(String),
}
