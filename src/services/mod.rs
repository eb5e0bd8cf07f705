// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod federation;
pub mod google;
pub mod oauth_state;
pub mod password;
pub mod token;

pub use auth::AuthService;
pub use federation::{AuthorizationStart, OAuthFederator};
pub use google::{GoogleEndpoints, GoogleOAuthClient, IdentityProvider, ProviderUserInfo};
pub use password::PasswordHasher;
pub use token::{Claims, TokenAuthority, TokenError, TokenKind, TokenPair};
