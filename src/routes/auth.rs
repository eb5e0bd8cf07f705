// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password account routes: sign-up, sign-in and token refresh.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{RefreshRequest, SignInRequest, SignUpRequest, StatusResponse, TokensResponse};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/token/refresh", post(refresh))
}

/// Unwrap a JSON body, mapping any rejection to the generic parse error.
fn parse_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::info!(error = %rejection.body_text(), "Request body rejected");
        AppError::BadRequest(AppError::BODY_NOT_PARSED.to_string())
    })
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>> {
    state.auth.sign_up(parse_body(payload)?).await?;
    Ok(Json(StatusResponse::ok()))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<TokensResponse>> {
    let tokens = state.auth.sign_in(parse_body(payload)?).await?;
    Ok(Json(TokensResponse {
        access_token: tokens.access_token,
        refresh_token: Some(tokens.refresh_token),
    }))
}

/// Only the new access token is returned; the client keeps its refresh token.
async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokensResponse>> {
    let request = parse_body(payload)?;
    let tokens = state.auth.refresh(&request.refresh_token)?;
    Ok(Json(TokensResponse {
        access_token: tokens.access_token,
        refresh_token: None,
    }))
}
