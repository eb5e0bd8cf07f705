// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres user store.

use super::{StoreError, UserStore};
use crate::config::DbConfig;
use crate::models::{NewUser, User};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

const CONN_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres-backed user store. Cloning shares the connection pool.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Connect, create the schema if needed, and run migrations.
    pub async fn connect(config: &DbConfig, application_name: &str) -> anyhow::Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .application_name(application_name)
            .options([("search_path", config.schema.as_str())]);

        let pool = pool_options(config).connect_with(options).await?;

        // Schema name is restricted to an identifier by the config loader.
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", config.schema))
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!(
            host = %config.host,
            database = %config.name,
            schema = %config.schema,
            "Connected to Postgres"
        );

        Ok(Self { pool })
    }
}

/// sqlx has no idle-connection ceiling; `max_idle_conns` becomes the number
/// of connections the pool keeps open, never more than `max_open_conns`.
fn pool_options(config: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(config.max_idle_conns.min(config.max_open_conns))
        .max_lifetime(CONN_MAX_LIFETIME)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, login, email, password AS password_hash, federated FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)
    }

    async fn get_by_login(&self, login: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, login, email, password AS password_hash, federated FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)
    }

    async fn get_by_login_or_email(&self, login: &str, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, login, email, password AS password_hash, federated FROM users \
             WHERE login = $1 OR email = $2 ORDER BY id LIMIT 1",
        )
        .bind(login)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (login, email, password, federated) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.login)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.federated)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::Duplicate;
                }
            }
            backend(e)
        })?;

        Ok(user.into_user(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_config(max_idle_conns: u32, max_open_conns: u32) -> DbConfig {
        DbConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "auth".to_string(),
            password: String::new(),
            name: "auth".to_string(),
            schema: "public".to_string(),
            max_idle_conns,
            max_open_conns,
        }
    }

    #[test]
    fn test_idle_conns_is_pool_floor() {
        let options = pool_options(&db_config(2, 4));

        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 2);
    }

    #[test]
    fn test_idle_conns_clamped_to_open_conns() {
        let options = pool_options(&db_config(10, 4));

        assert_eq!(options.get_min_connections(), 4);
    }
}
