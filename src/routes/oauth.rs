// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 sign-in routes.

use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{AuthorizationUrlResponse, TokensResponse};
use crate::services::oauth_state::SESSION_STATE_TTL_SECS;
use crate::services::TokenPair;
use crate::AppState;

/// Cookie carrying the OAuth2 session id in session-state mode.
pub const SESSION_COOKIE: &str = "oauth2_session";
const COOKIE_PATH: &str = "/oauth2/google";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/oauth2/google/signin", post(google_sign_in))
        .route("/oauth2/google/callback", get(google_callback))
}

/// Query parameters Google appends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Start the OAuth2 flow.
///
/// Signed-state mode answers with the consent URL; session mode sets the
/// session cookie and redirects the browser straight to Google.
async fn google_sign_in(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let start = state.federator.begin()?;

    match start.session_id {
        None => Ok(Json(AuthorizationUrlResponse { url: start.url }).into_response()),
        Some(session_id) => {
            let secure = state.config.google.callback_url.starts_with("https://");
            let cookie = Cookie::build((SESSION_COOKIE, session_id))
                .path(COOKIE_PATH)
                .http_only(true)
                .secure(secure)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::seconds(SESSION_STATE_TTL_SECS))
                .build();
            Ok((jar.add(cookie), Redirect::temporary(&start.url)).into_response())
        }
    }
}

/// Finish the OAuth2 flow.
///
/// The state is checked before the authorization code is touched. A query
/// string that cannot be parsed carries no usable state and is refused the
/// same way.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    query: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = query.map_err(|e| {
        tracing::info!(error = %e, "Unparseable OAuth2 callback query");
        AppError::Unauthorized("unauthorized".to_string())
    })?;

    let session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    state
        .federator
        .verify_state(params.state.as_deref(), session_id.as_deref())?;

    let jar = match session_id {
        Some(_) => jar.remove(Cookie::build(SESSION_COOKIE).path(COOKIE_PATH)),
        None => jar,
    };

    if let Some(error) = params.error {
        tracing::info!(error = %error, "Provider denied authorization");
        return Err(AppError::Unauthorized("authorization denied".to_string()));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    let identity = state.federator.fetch_identity(&code).await?;
    let user = state.auth.resolve_federated_user(&identity).await?;
    let tokens = state
        .auth
        .tokens()
        .create_tokens(&user.email)
        .context("mint tokens on federated sign-in")?;

    tracing::info!(user_id = user.id, "Federated sign-in complete");

    let response = match &state.config.client_callback_url {
        Some(client_url) => client_redirect(client_url, &tokens),
        None => Json(TokensResponse {
            access_token: tokens.access_token,
            refresh_token: Some(tokens.refresh_token),
        })
        .into_response(),
    };

    Ok((jar, response).into_response())
}

/// 302 to the client application with the tokens in the query string.
fn client_redirect(client_url: &str, tokens: &TokenPair) -> Response {
    let separator = if client_url.contains('?') { '&' } else { '?' };
    let location = format!(
        "{client_url}{separator}access_token={}&refresh_token={}",
        urlencoding::encode(&tokens.access_token),
        urlencoding::encode(&tokens.refresh_token),
    );
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
