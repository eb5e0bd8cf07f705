// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store backed by concurrent hash maps.

use super::{StoreError, UserStore};
use crate::models::{NewUser, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// User store used when no database is configured, and by tests.
///
/// Login and email uniqueness is claimed through per-key map entries, so
/// concurrent inserts of the same login or email cannot both succeed.
pub struct MemoryUserStore {
    users: DashMap<i64, User>,
    logins: DashMap<String, i64>,
    emails: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            logins: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn lookup(&self, index: &DashMap<String, i64>, key: &str) -> Option<User> {
        let id = *index.get(key)?;
        self.users.get(&id).map(|user| user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.users
            .get(&id)
            .map(|user| user.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_login(&self, login: &str) -> Result<User, StoreError> {
        self.lookup(&self.logins, login).ok_or(StoreError::NotFound)
    }

    async fn get_by_login_or_email(&self, login: &str, email: &str) -> Result<User, StoreError> {
        self.lookup(&self.logins, login)
            .or_else(|| self.lookup(&self.emails, email))
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        match self.logins.entry(user.login.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                self.logins.remove(&user.login);
                return Err(StoreError::Duplicate);
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let user = user.into_user(id);
        self.users.insert(id, user.clone());
        Ok(user)
    }
}
