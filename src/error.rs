// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Application error type that converts to HTTP responses.
///
/// Only the message of client-facing variants reaches the response body;
/// the cause of an `Internal` error is logged and replaced by a generic
/// message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const BODY_NOT_PARSED: &'static str = "request body not parsed";
    pub const BAD_CREDENTIALS: &'static str = "incorrect login or password";
    pub const USER_EXISTS: &'static str = "user with this email or login already exists";
    pub const INTERNAL: &'static str = "internal server error";

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error envelope shared by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg) => msg,
            AppError::Unauthorized(msg) => msg,
            AppError::Internal(err) => {
                tracing::error!(error = format!("{err:#}"), "Internal server error");
                AppError::INTERNAL.to_string()
            }
        };

        (status, Json(ErrorResponse::new(status, message))).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
