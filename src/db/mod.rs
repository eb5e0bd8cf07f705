// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: user lookup and insertion.

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::models::{NewUser, User};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    /// Login or email is already taken.
    #[error("user already exists")]
    Duplicate,

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence capability used by the authentication flows.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError>;

    async fn get_by_login(&self, login: &str) -> Result<User, StoreError>;

    /// Any user whose login equals `login` or whose email equals `email`.
    async fn get_by_login_or_email(&self, login: &str, email: &str) -> Result<User, StoreError>;

    /// Insert a user. Must fail with [`StoreError::Duplicate`] when the login
    /// or email is taken, whatever checks the caller made beforehand.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
}
