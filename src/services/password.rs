// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing via bcrypt.

/// bcrypt with a deployment-wide cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Check `plaintext` against a stored digest.
    ///
    /// A mismatch is a normal negative result. A digest that cannot be
    /// parsed also counts as a mismatch.
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        match bcrypt::verify(plaintext, digest) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password digest could not be checked");
                false
            }
        }
    }

    /// Hash of a random secret nobody knows, for accounts without a local
    /// password.
    pub fn unusable_hash(&self) -> Result<String, PasswordError> {
        self.hash(&uuid::Uuid::new_v4().to_string())
    }
}
