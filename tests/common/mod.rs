// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokengate::config::Config;
use tokengate::db::{MemoryUserStore, UserStore};
use tokengate::routes::create_router;
use tokengate::services::google::{
    IdentityProvider, ProviderError, ProviderToken, ProviderUserInfo,
};
use tokengate::AppState;

/// Check if a Postgres server is configured for integration tests.
#[allow(dead_code)]
pub fn database_available() -> bool {
    std::env::var("DB_HOST").is_ok()
}

/// Skip test with message if no database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        if !crate::common::database_available() {
            eprintln!("⚠️  Skipping: DB_HOST not set");
            return;
        }
    };
}

/// Email the fake provider reports for the signed-in user.
#[allow(dead_code)]
pub const PROVIDER_EMAIL: &str = "walker@gmail.com";

/// Authorization code the fake provider refuses to exchange.
#[allow(dead_code)]
pub const BAD_CODE: &str = "revoked-code";

/// Identity provider double that counts code exchanges.
pub struct FakeProvider {
    pub exchanges: AtomicUsize,
    pub email: String,
    pub verified: bool,
}

impl FakeProvider {
    pub fn new(email: &str, verified: bool) -> Self {
        Self {
            exchanges: AtomicUsize::new(0),
            email: email.to_string(),
            verified,
        }
    }

    #[allow(dead_code)]
    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "https://accounts.test/o/oauth2/auth?response_type=code&state={}",
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, ProviderError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == BAD_CODE {
            return Err(ProviderError::Status {
                status: 400,
                body: r#"{"error":"invalid_grant"}"#.to_string(),
            });
        }
        Ok(ProviderToken {
            access_token: format!("provider-token-{code}"),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3599),
        })
    }

    async fn fetch_user_info(
        &self,
        _token: &ProviderToken,
    ) -> Result<ProviderUserInfo, ProviderError> {
        Ok(ProviderUserInfo {
            id: "107691503500061507151".to_string(),
            email: self.email.clone(),
            verified_email: self.verified,
            picture: None,
        })
    }
}

/// Test app with in-memory dependencies.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryUserStore>,
    pub provider: Arc<FakeProvider>,
}

/// Default config with a bcrypt cost cheap enough for tests.
pub fn test_config() -> Config {
    Config {
        bcrypt_cost: 4,
        ..Config::default()
    }
}

#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(test_config(), FakeProvider::new(PROVIDER_EMAIL, true))
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config, provider: FakeProvider) -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    let provider = Arc::new(provider);
    let state = Arc::new(AppState::new(config, store.clone(), provider.clone()));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        provider,
    }
}

/// Test app around an arbitrary user store.
#[allow(dead_code)]
pub fn create_test_app_with_store(store: Arc<dyn UserStore>) -> axum::Router {
    let provider = Arc::new(FakeProvider::new(PROVIDER_EMAIL, true));
    create_router(Arc::new(AppState::new(test_config(), store, provider)))
}

#[allow(dead_code)]
pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn bearer_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pull the decoded `state` parameter out of a provider consent URL.
#[allow(dead_code)]
pub fn state_from_url(url: &str) -> String {
    let raw = url
        .split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("state="))
        .expect("consent URL carries a state");
    urlencoding::decode(raw).unwrap().into_owned()
}
