// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Top-level recovery: panics and middleware failures become a generic 500.

use crate::error::{AppError, ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use std::any::Any;

/// Response for a panicking handler (used with `CatchPanicLayer::custom`).
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, Json(ErrorResponse::new(status, AppError::INTERNAL))).into_response()
}

/// Convert errors from fallible tower layers (the request deadline) into
/// the error envelope.
pub async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Internal(anyhow::anyhow!("request deadline exceeded"))
    } else {
        AppError::Internal(anyhow::anyhow!("unhandled middleware error: {err}"))
    }
}
