// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account flows: sign-up, sign-in, token refresh, and resolution of
//! token subjects and federated identities to local users.
//!
//! Token subjects are logins for password users and emails for federated
//! users. Logins may not contain `@`, so the two never collide.

use crate::db::{StoreError, UserStore};
use crate::error::{AppError, Result};
use crate::models::{NewUser, SignInRequest, SignUpRequest, User};
use crate::services::google::ProviderUserInfo;
use crate::services::password::PasswordHasher;
use crate::services::token::{TokenAuthority, TokenPair};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::OnceCell;
use validator::Validate;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenAuthority,
    /// Digest checked on sign-in for unknown logins, so both failure paths
    /// pay for one bcrypt verification.
    dummy_digest: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: TokenAuthority) -> Self {
        Self {
            users,
            hasher,
            tokens,
            dummy_digest: Arc::new(OnceCell::new()),
        }
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    /// Register a password user. No tokens are issued; the caller signs in
    /// separately.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<User> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        match self
            .users
            .get_by_login_or_email(&request.login, &request.email)
            .await
        {
            Ok(existing) if existing.login == request.login || existing.email == request.email => {
                tracing::info!(login = %request.login, "Sign-up rejected: user already exists");
                return Err(AppError::BadRequest(AppError::USER_EXISTS.to_string()));
            }
            Ok(_) | Err(StoreError::NotFound) => {}
            Err(e) => return Err(internal(e, "look up existing user for sign-up")),
        }

        let password_hash = self.hash_password(request.password).await?;

        // Two concurrent sign-ups can both pass the lookup above; the store's
        // uniqueness check decides which one wins.
        let user = self
            .users
            .insert(NewUser {
                login: request.login,
                email: request.email,
                password_hash,
                federated: false,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => AppError::BadRequest(AppError::USER_EXISTS.to_string()),
                e => internal(e, "insert user on sign-up"),
            })?;

        tracing::info!(user_id = user.id, login = %user.login, "User signed up");
        Ok(user)
    }

    /// Check credentials and mint tokens keyed by the user's login.
    pub async fn sign_in(&self, request: SignInRequest) -> Result<TokenPair> {
        let user = match self.users.get_by_login(&request.login).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                let digest = self.dummy_digest().await?;
                self.verify_password(digest, request.password).await?;
                tracing::info!(login = %request.login, "Sign-in for unknown login");
                return Err(AppError::BadRequest(AppError::BAD_CREDENTIALS.to_string()));
            }
            Err(e) => return Err(internal(e, "look up user for sign-in")),
        };

        if !self
            .verify_password(user.password_hash.clone(), request.password)
            .await?
        {
            tracing::info!(login = %user.login, "Sign-in with wrong password");
            return Err(AppError::BadRequest(AppError::BAD_CREDENTIALS.to_string()));
        }

        let tokens = self
            .tokens
            .create_tokens(&user.login)
            .context("mint tokens on sign-in")?;

        tracing::info!(user_id = user.id, "User signed in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair. Any failure is `Unauthorized`.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        self.tokens.validate_and_rotate(refresh_token).map_err(|e| {
            tracing::info!(error = %e, "Refresh token rejected");
            AppError::Unauthorized("unauthorized".to_string())
        })
    }

    /// Find the local user for a provider identity, provisioning one on
    /// first sign-in.
    ///
    /// Only accounts created by a federated sign-in are resolved. Sign-up
    /// does not prove ownership of the email, so an existing password
    /// account with the provider's email is a conflict, never a link.
    pub async fn resolve_federated_user(&self, info: &ProviderUserInfo) -> Result<User> {
        if !info.verified_email {
            tracing::warn!(provider_id = %info.id, "Provider email is not verified");
            return Err(AppError::Unauthorized("email not verified".to_string()));
        }

        match self.find_by_email(&info.email).await {
            Ok(user) => return federated_only(user),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(internal(e, "look up federated user")),
        }

        // Federated users get a random login and a password nobody knows.
        let password_hash = self.unusable_password_hash().await?;
        let new_user = NewUser {
            login: uuid::Uuid::new_v4().simple().to_string(),
            email: info.email.clone(),
            password_hash,
            federated: true,
        };

        match self.users.insert(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Provisioned federated user");
                Ok(user)
            }
            // Lost a race with a concurrent insert for the same email.
            Err(StoreError::Duplicate) => {
                let user = self
                    .find_by_email(&info.email)
                    .await
                    .map_err(|e| internal(e, "look up federated user after insert conflict"))?;
                federated_only(user)
            }
            Err(e) => Err(internal(e, "insert federated user")),
        }
    }

    /// Resolve a verified token subject to its user.
    pub async fn user_for_subject(&self, subject: &str) -> Result<User> {
        let found = if subject.contains('@') {
            self.find_by_email(subject).await
        } else {
            self.users.get_by_login(subject).await
        };

        found.map_err(|e| match e {
            StoreError::NotFound => {
                tracing::warn!(subject = %subject, "Token subject has no user");
                AppError::Unauthorized("user not found".to_string())
            }
            e => internal(e, "look up user for token subject"),
        })
    }

    async fn find_by_email(&self, email: &str) -> std::result::Result<User, StoreError> {
        self.users.get_by_login_or_email(email, email).await
    }

    async fn dummy_digest(&self) -> Result<String> {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| self.unusable_password_hash())
            .await?;
        Ok(digest.clone())
    }

    async fn hash_password(&self, plaintext: String) -> Result<String> {
        let hasher = self.hasher;
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .context("password hashing task")?
            .context("hash password")?;
        Ok(digest)
    }

    async fn unusable_password_hash(&self) -> Result<String> {
        let hasher = self.hasher;
        let digest = tokio::task::spawn_blocking(move || hasher.unusable_hash())
            .await
            .context("password hashing task")?
            .context("hash placeholder password")?;
        Ok(digest)
    }

    async fn verify_password(&self, digest: String, plaintext: String) -> Result<bool> {
        let hasher = self.hasher;
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&digest, &plaintext))
            .await
            .context("password verification task")?;
        Ok(matches)
    }
}

fn federated_only(user: User) -> Result<User> {
    if user.federated {
        Ok(user)
    } else {
        tracing::warn!(
            user_id = user.id,
            "Federated sign-in for an email held by a password account"
        );
        Err(AppError::BadRequest(AppError::USER_EXISTS.to_string()))
    }
}

fn internal(err: StoreError, context: &'static str) -> AppError {
    AppError::Internal(anyhow::Error::new(err).context(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use chrono::Duration;

    fn service() -> (AuthService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let tokens = TokenAuthority::new(b"unit-test-secret", Duration::hours(1), Duration::hours(2));
        (
            AuthService::new(store.clone(), PasswordHasher::new(4), tokens),
            store,
        )
    }

    fn signup(login: &str, email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            login: login.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn google_user(email: &str, verified: bool) -> ProviderUserInfo {
        ProviderUserInfo {
            id: "1234".to_string(),
            email: email.to_string(),
            verified_email: verified,
            picture: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (auth, _) = service();
        auth.sign_up(signup("alice", "a@x.com", "pw")).await.unwrap();

        let tokens = auth
            .sign_in(SignInRequest {
                login: "alice".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        let claims = auth.tokens().validate(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn test_sign_up_conflict_on_either_field() {
        let (auth, _) = service();
        auth.sign_up(signup("alice", "a@x.com", "pw")).await.unwrap();

        for request in [
            signup("alice", "new@x.com", "pw"),
            signup("bob", "a@x.com", "pw"),
        ] {
            let err = auth.sign_up(request).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m == AppError::USER_EXISTS));
        }
    }

    #[tokio::test]
    async fn test_sign_up_rejects_login_with_at_sign() {
        let (auth, _) = service();
        let err = auth
            .sign_up(signup("a@x.com", "a@x.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_sign_in_messages_do_not_reveal_login_existence() {
        let (auth, _) = service();
        auth.sign_up(signup("alice", "a@x.com", "pw")).await.unwrap();

        let wrong_password = auth
            .sign_in(SignInRequest {
                login: "alice".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_login = auth
            .sign_in(SignInRequest {
                login: "mallory".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_login.to_string());
        assert!(matches!(wrong_password, AppError::BadRequest(ref m) if m == AppError::BAD_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_unknown_login_still_checks_a_digest() {
        let (auth, _) = service();
        assert!(auth.dummy_digest.get().is_none());

        let err = auth
            .sign_in(SignInRequest {
                login: "mallory".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref m) if m == AppError::BAD_CREDENTIALS));
        let digest = auth.dummy_digest.get().cloned().unwrap();
        assert!(digest.starts_with("$2"));

        // The digest is made once and reused.
        auth.sign_in(SignInRequest {
            login: "trudy".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap_err();
        assert_eq!(auth.dummy_digest.get(), Some(&digest));
    }

    #[tokio::test]
    async fn test_password_account_email_not_linked() {
        let (auth, store) = service();
        auth.sign_up(signup("attacker", "g@gmail.com", "known"))
            .await
            .unwrap();

        let err = auth
            .resolve_federated_user(&google_user("g@gmail.com", true))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref m) if m == AppError::USER_EXISTS));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_federated_user_provisioned_once() {
        let (auth, store) = service();

        let first = auth
            .resolve_federated_user(&google_user("g@gmail.com", true))
            .await
            .unwrap();
        let second = auth
            .resolve_federated_user(&google_user("g@gmail.com", true))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(first.email, "g@gmail.com");
        assert!(first.federated);
        assert!(!first.login.contains('@'));
        assert_eq!(auth.user_for_subject("g@gmail.com").await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_federated_user_has_no_usable_password() {
        let (auth, _) = service();
        let user = auth
            .resolve_federated_user(&google_user("g@gmail.com", true))
            .await
            .unwrap();

        for password in ["", "g@gmail.com", user.login.as_str()] {
            let result = auth
                .sign_in(SignInRequest {
                    login: user.login.clone(),
                    password: password.to_string(),
                })
                .await;
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn test_unverified_provider_email_rejected() {
        let (auth, store) = service();
        let err = auth
            .resolve_federated_user(&google_user("g@gmail.com", false))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_subject_is_unauthorized() {
        let (auth, _) = service();

        assert!(matches!(
            auth.user_for_subject("ghost").await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
