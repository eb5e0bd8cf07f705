// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes behind the bearer token gate.

use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::UserResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/protected/user", get(current_user))
}

/// Profile of the caller identified by the access token.
async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state.auth.user_for_subject(&caller.subject).await?;
    Ok(Json(user.into()))
}
