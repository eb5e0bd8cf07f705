// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request logging with secrets masked.
//!
//! Query strings and response bodies are not logged: they carry OAuth2
//! codes and bearer tokens.

use crate::error::AppError;
use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::time::Instant;

/// Largest request body accepted (and logged).
const MAX_BODY_BYTES: usize = 64 * 1024;

const SECRET_PLACEHOLDER: &str = "**********";
const SECRET_FIELDS: [&str; 3] = ["password", "access_token", "refresh_token"];

/// Log every request with its (masked) JSON body and response status.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(method = %method, path = %path, error = %e, "Request body rejected");
            return AppError::BadRequest("request body too large".to_string()).into_response();
        }
    };

    let request_body = mask_secrets(&bytes);
    let started = Instant::now();
    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        request_body = %request_body,
        "HTTP request"
    );

    response
}

/// Render a request body for the log with secret fields replaced.
pub fn mask_secrets(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut fields)) => {
            for name in SECRET_FIELDS {
                if let Some(value) = fields.get_mut(name) {
                    *value = Value::String(SECRET_PLACEHOLDER.to_string());
                }
            }
            Value::Object(fields).to_string()
        }
        Ok(_) => "<non-object body>".to_string(),
        Err(_) => "<unparsed body>".to_string(),
    }
}
