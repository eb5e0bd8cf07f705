// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tokengate: credential and session service
//!
//! Password sign-up and sign-in, Google OAuth2 federation, and stateless
//! HS256 bearer tokens guarding protected routes.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::UserStore;
use services::{AuthService, IdentityProvider, OAuthFederator, PasswordHasher, TokenAuthority};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub federator: OAuthFederator,
}

impl AppState {
    /// Wire the services around a user store and an identity provider.
    ///
    /// One [`TokenAuthority`] is shared by the account flows, the OAuth2
    /// state tokens and the bearer gate.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let tokens = TokenAuthority::from_config(&config.jwt);
        let auth = AuthService::new(users, PasswordHasher::new(config.bcrypt_cost), tokens.clone());
        let federator = OAuthFederator::new(provider, tokens, config.oauth_state_mode);

        Self {
            config,
            auth,
            federator,
        }
    }
}
