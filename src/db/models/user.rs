//! User and session models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::timestamp_now;
use crate::db::StoreError;

/// Format SQLite's `datetime('now')` produces, so expiry checks compare like with like
const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

impl User {
    /// Insert a new user. Fails with `DuplicateUsername` when the name is taken.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        if Self::find_by_username(db, username).await?.is_some() {
            return Err(StoreError::DuplicateUsername);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();

        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(password_hash)
        .bind(&now)
        .execute(db)
        .await;

        // A concurrent registration can slip past the lookup above
        if let Err(e) = result {
            let err = StoreError::from(e);
            return Err(if err.is_unique_violation() {
                StoreError::DuplicateUsername
            } else {
                err
            });
        }

        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, username, password_hash, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(db)
            .await
    }

    pub async fn get_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, username, password_hash, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

#[cfg(test)]
impl User {
    pub async fn count_by_username(db: &SqlitePool, username: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(db)
            .await
    }
}

/// Server-side session row. Only the hash of the cookie token is stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

impl Session {
    pub async fn create(
        db: &SqlitePool,
        user_id: &str,
        token_hash: &str,
        ttl: chrono::Duration,
    ) -> Result<Session, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now();
        let expires_at = (now + ttl).format(SQLITE_DATETIME_FORMAT).to_string();
        let created_at = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(token_hash)
        .bind(&expires_at)
        .bind(&created_at)
        .execute(db)
        .await?;

        Ok(Session {
            id,
            user_id: user_id.to_string(),
            token_hash: token_hash.to_string(),
            expires_at,
            created_at,
        })
    }

    /// Look up a session that has not yet expired
    pub async fn find_active(
        db: &SqlitePool,
        token_hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM sessions
            WHERE token_hash = ? AND expires_at > datetime('now')
            "#,
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every expired session, returning how many were dropped
    pub async fn delete_expired(db: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= datetime('now')")
            .execute(db)
            .await?;

        Ok(result.rows_affected())
    }
}
