// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-held OAuth2 state for the session-bound flow.
//!
//! Each pending sign-in is keyed by a random session id (sent to the
//! browser as a cookie) and expires after five minutes. Entries are
//! removed when read, so a state can be checked at most once.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use subtle::ConstantTimeEq;

/// Lifetime of a pending sign-in.
pub const SESSION_STATE_TTL_SECS: i64 = 5 * 60;

struct PendingState {
    state: String,
    expires_at: DateTime<Utc>,
}

/// Upper bound on pending sign-ins held at once.
pub const MAX_PENDING_STATES: usize = 10_000;

pub struct SessionStateStore {
    pending: DashMap<String, PendingState>,
    capacity: usize,
}

impl Default for SessionStateStore {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_STATES)
    }
}

impl SessionStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: DashMap::new(),
            capacity,
        }
    }

    /// Start a sign-in. Returns `(session_id, state)`, or `None` when the
    /// store is full of unexpired entries.
    ///
    /// The capacity check is not atomic with the insert, so concurrent
    /// callers may overshoot it by a few entries.
    pub fn issue(&self) -> Option<(String, String)> {
        self.purge_expired();
        if self.pending.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "OAuth2 session state store is full");
            return None;
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let state = uuid::Uuid::new_v4().to_string();
        self.pending.insert(
            session_id.clone(),
            PendingState {
                state: state.clone(),
                expires_at: Utc::now() + Duration::seconds(SESSION_STATE_TTL_SECS),
            },
        );
        Some((session_id, state))
    }

    /// Consume the entry for `session_id` and compare it with the callback's
    /// `state`.
    pub fn verify(&self, session_id: &str, received: &str) -> bool {
        let Some((_, pending)) = self.pending.remove(session_id) else {
            return false;
        };
        if pending.expires_at <= Utc::now() {
            return false;
        }
        bool::from(pending.state.as_bytes().ct_eq(received.as_bytes()))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.pending.retain(|_, pending| pending.expires_at > now);
    }

    #[cfg(test)]
    fn insert_expired(&self, session_id: &str, state: &str) {
        self.pending.insert(
            session_id.to_string(),
            PendingState {
                state: state.to_string(),
                expires_at: Utc::now() - Duration::seconds(1),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify() {
        let store = SessionStateStore::new();
        let (session_id, state) = store.issue().unwrap();

        assert!(store.verify(&session_id, &state));
    }

    #[test]
    fn test_state_is_single_use() {
        let store = SessionStateStore::new();
        let (session_id, state) = store.issue().unwrap();

        assert!(store.verify(&session_id, &state));
        assert!(!store.verify(&session_id, &state));
    }

    #[test]
    fn test_mismatch_consumes_entry() {
        let store = SessionStateStore::new();
        let (session_id, state) = store.issue().unwrap();

        assert!(!store.verify(&session_id, "forged"));
        assert!(!store.verify(&session_id, &state));
    }

    #[test]
    fn test_unknown_session_rejected() {
        let store = SessionStateStore::new();
        let (_, state) = store.issue().unwrap();

        assert!(!store.verify("no-such-session", &state));
    }

    #[test]
    fn test_expired_state_rejected() {
        let store = SessionStateStore::new();
        store.insert_expired("sid", "state");

        assert!(!store.verify("sid", "state"));
    }

    #[test]
    fn test_issue_purges_expired_entries() {
        let store = SessionStateStore::new();
        store.insert_expired("old", "state");
        assert_eq!(store.len(), 1);

        store.issue().unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.verify("old", "state"));
    }

    #[test]
    fn test_full_store_refuses_new_sign_ins() {
        let store = SessionStateStore::with_capacity(2);
        let (first, state) = store.issue().unwrap();
        store.issue().unwrap();

        assert!(store.issue().is_none());
        assert_eq!(store.len(), 2);

        // Completing a sign-in frees its slot.
        assert!(store.verify(&first, &state));
        assert!(store.issue().is_some());
    }

    #[test]
    fn test_expired_entries_do_not_count_against_capacity() {
        let store = SessionStateStore::with_capacity(1);
        store.insert_expired("old", "state");

        assert!(store.issue().is_some());
    }
}
