//! # rg-db-sqlite Implementation
//!
//! This crate implements the data mapping between the SQLite relational model
//! and the `rg-core` domain models. One [`SqliteRepo`] handle implements every
//! repository port; clone it freely, the pool is shared.

use std::str::FromStr;

use rg_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

mod comments;
mod images;
mod messages;
mod ratings;
mod tags;
mod transforms;
mod users;

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

/// Maps driver failures onto the domain taxonomy. Constraint violations are
/// caller errors; everything else is logged and reported as internal.
pub(crate) fn db_err(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::validation("referenced row does not exist");
        }
        if db.is_check_violation() {
            return AppError::validation(db.message().to_string());
        }
    }
    log::error!("sqlite error: {e}");
    AppError::Internal(e.to_string())
}

/// Wraps a domain conversion failure raised while decoding a row.
pub(crate) fn decode_err<E>(e: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(e))
}

impl SqliteRepo {
    /// Opens (creating if needed) the database at `url` and applies migrations.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives exactly as long as its one connection.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };
        let pool = pool_options.connect_with(options).await.map_err(db_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;
        log::info!("sqlite store ready at {url}");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
