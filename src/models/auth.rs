// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request and response bodies of the authentication endpoints.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(
        length(min = 1, max = 64, message = "login must be 1-64 characters"),
        custom(function = "validate_login")
    )]
    pub login: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    // bcrypt only looks at the first 72 bytes
    #[validate(length(min = 1, max = 72, message = "password must be 1-72 characters"))]
    pub password: String,
}

/// Logins share the token-subject namespace with emails, so they may not
/// look like one.
fn validate_login(login: &str) -> Result<(), ValidationError> {
    if login.contains('@') {
        return Err(ValidationError::new("login_contains_at")
            .with_message("login must not contain '@'".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Generic success payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Bearer tokens handed to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokensResponse {
    pub access_token: String,
    /// Omitted on refresh, where only a new access token is returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Provider authorization URL for the signed-state OAuth2 flow.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizationUrlResponse {
    pub url: String,
}
