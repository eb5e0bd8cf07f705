// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token authority: mints and verifies stateless HS256 bearer tokens.
//!
//! Handles:
//! - Access/refresh token pairs keyed by a subject (login or email)
//! - Verification with a fixed, strongly-typed claim schema
//! - Refresh rotation (the old refresh token stays valid until expiry;
//!   there is no revocation list)
//! - Short-lived OAuth2 state tokens carrying a random nonce

use crate::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Lifetime of an OAuth2 state token.
pub const STATE_TOKEN_TTL_SECS: i64 = 5 * 60;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    State,
}

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    /// Subject (login, email, or a state nonce)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub kind: TokenKind,
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature mismatch, expired, or wrong kind")]
    Invalid,

    #[error("token claims are missing or ill-typed")]
    ClaimMissing,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::MissingRequiredClaim(_) => TokenError::ClaimMissing,
            // Payload is valid JSON but does not fit the claim schema.
            ErrorKind::Json(e) if e.classify() == serde_json::error::Category::Data => {
                TokenError::ClaimMissing
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        }
    }
}

/// Sole issuer and verifier of bearer tokens. Owns the signing secret.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expiry is exact; no clock-skew grace.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            &config.secret,
            Duration::hours(config.access_token_hours),
            Duration::hours(config.refresh_token_hours),
        )
    }

    /// Mint an access/refresh pair for `subject`.
    ///
    /// Each token expires after its own configured lifetime; the refresh
    /// token never inherits the access lifetime.
    pub fn create_tokens(&self, subject: &str) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(subject, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.issue(subject, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    /// Mint a single signed token.
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry. Any failure yields no trusted claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.sub.is_empty() {
            return Err(TokenError::ClaimMissing);
        }
        Ok(data.claims)
    }

    /// [`validate`](Self::validate), additionally requiring a token kind.
    pub fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.validate(token)?;
        if claims.kind != kind {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Validate a refresh token and mint a new pair for its subject.
    pub fn validate_and_rotate(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claims = self.validate_kind(refresh_token, TokenKind::Refresh)?;
        self.create_tokens(&claims.sub)
    }

    /// Mint an OAuth2 state token whose subject is a fresh random nonce.
    pub fn issue_state(&self) -> Result<String, TokenError> {
        let nonce = uuid::Uuid::new_v4().to_string();
        self.issue(&nonce, TokenKind::State, Duration::seconds(STATE_TOKEN_TTL_SECS))
    }

    pub fn verify_state(&self, state: &str) -> Result<Claims, TokenError> {
        self.validate_kind(state, TokenKind::State)
    }
}
