use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

/// Errors surfaced by request handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Coordinates out of range: {0}")]
    OutOfRange(String),

    #[error("Rate limit exceeded: {limit} per {window_minutes} minute")]
    RateLimited {
        limit: u32,
        window_minutes: u64,
        retry_after: Duration,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Storage error")]
    Storage(#[from] StoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::MalformedTimestamp(_) | AppError::OutOfRange(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            AppError::Storage(e) => {
                error!("Storage failure: {}", e);
                ErrorResponse {
                    status: "error",
                    message: "Internal server error".to_string(),
                }
            }
            other => ErrorResponse {
                status: "fail",
                message: other.to_string(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after, .. } = self {
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Errors that stop the service from starting or serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}
