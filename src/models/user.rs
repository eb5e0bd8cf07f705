// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User record as persisted by a [`UserStore`](crate::db::UserStore).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Unique login; also the token subject for password users
    pub login: String,
    /// Unique email; the token subject for federated users
    pub email: String,
    /// bcrypt digest
    pub password_hash: String,
    /// Provisioned by a federated sign-in rather than password sign-up
    pub federated: bool,
}

/// User fields supplied on insert; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub federated: bool,
}

impl NewUser {
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            login: self.login,
            email: self.email,
            password_hash: self.password_hash,
            federated: self.federated,
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i64,
    pub login: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            email: user.email,
        }
    }
}
