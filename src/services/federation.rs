// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 federation: binds the provider redirect to a state value and
//! turns a verified callback into a provider identity.
//!
//! Two state variants are supported:
//! - `Signed`: the state is a short-lived token from the [`TokenAuthority`]
//!   with a random nonce as subject. Nothing is stored server-side.
//! - `Session`: a random state is stored against a session id that the
//!   browser carries as a cookie; the callback consumes it.

use crate::config::StateMode;
use crate::error::{AppError, Result};
use crate::services::google::{IdentityProvider, ProviderUserInfo};
use crate::services::oauth_state::SessionStateStore;
use crate::services::token::TokenAuthority;
use anyhow::Context;
use std::sync::Arc;

/// Where to send the browser, plus the session id in session mode.
#[derive(Debug, Clone)]
pub struct AuthorizationStart {
    pub url: String,
    pub session_id: Option<String>,
}

pub struct OAuthFederator {
    provider: Arc<dyn IdentityProvider>,
    tokens: TokenAuthority,
    sessions: SessionStateStore,
    mode: StateMode,
}

impl OAuthFederator {
    pub fn new(provider: Arc<dyn IdentityProvider>, tokens: TokenAuthority, mode: StateMode) -> Self {
        Self {
            provider,
            tokens,
            sessions: SessionStateStore::new(),
            mode,
        }
    }

    /// Mint a state value and build the provider consent URL around it.
    pub fn begin(&self) -> Result<AuthorizationStart> {
        let (state, session_id) = match self.mode {
            StateMode::Signed => {
                let state = self.tokens.issue_state().context("mint OAuth2 state token")?;
                (state, None)
            }
            StateMode::Session => {
                let (session_id, state) = self
                    .sessions
                    .issue()
                    .context("too many pending OAuth2 sign-ins")?;
                (state, Some(session_id))
            }
        };

        tracing::info!(mode = ?self.mode, "Starting OAuth2 sign-in");

        Ok(AuthorizationStart {
            url: self.provider.authorization_url(&state),
            session_id,
        })
    }

    /// Check that a callback answers a redirect this service issued.
    ///
    /// Must pass before the authorization code is used.
    pub fn verify_state(&self, state: Option<&str>, session_id: Option<&str>) -> Result<()> {
        let valid = match (self.mode, state) {
            (_, None) | (_, Some("")) => false,
            (StateMode::Signed, Some(state)) => match self.tokens.verify_state(state) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "OAuth2 state token rejected");
                    false
                }
            },
            (StateMode::Session, Some(state)) => session_id
                .map(|sid| self.sessions.verify(sid, state))
                .unwrap_or(false),
        };

        if valid {
            Ok(())
        } else {
            tracing::warn!(mode = ?self.mode, "Invalid OAuth2 state on callback");
            Err(AppError::Unauthorized("unauthorized".to_string()))
        }
    }

    /// Exchange the authorization code and fetch the user's profile.
    pub async fn fetch_identity(&self, code: &str) -> Result<ProviderUserInfo> {
        let token = self
            .provider
            .exchange_code(code)
            .await
            .context("exchange OAuth2 authorization code")?;

        let info = self
            .provider
            .fetch_user_info(&token)
            .await
            .context("fetch provider user info")?;

        tracing::info!(provider_id = %info.id, "Fetched provider identity");
        Ok(info)
    }
}
