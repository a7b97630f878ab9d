//! User records and their database store.
//!
//! Usernames are case-insensitively unique: every row keeps the display
//! form the user first typed plus a lowercased copy that carries the
//! uniqueness constraint and is used for lookups.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::warn;

use crate::db::DbPool;
use crate::sql;

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub username_lower: String,
    pub has_avatar: bool,
    pub created_at: DateTime<Utc>,
}

/// Database-backed storage for users.
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    /// Create a new UserStore using the given database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find a user by name (case-insensitive) or create one, returning the
    /// user id either way. The display form of an existing user is kept.
    pub async fn ensure(&self, username: &str) -> Result<i64> {
        let row = sqlx::query(sql::ENSURE_USER)
            .bind(username)
            .bind(username.to_lowercase())
            .bind(Utc::now().to_rfc3339())
            .fetch_one(&self.pool)
            .await
            .context("Failed to upsert user")?;

        Ok(row.get("user_id"))
    }

    /// Get a user by id.
    pub async fn get(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(sql::SELECT_USER)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query user")?;

        let user = match row {
            Some(row) => Some(User {
                user_id: row.get("user_id"),
                username: row.get("username"),
                username_lower: row.get("username_lower"),
                has_avatar: row.get("has_avatar"),
                created_at: DateTime::parse_from_rfc3339(row.get("created_at"))
                    .context("Invalid created_at timestamp")?
                    .with_timezone(&Utc),
            }),
            None => None,
        };

        Ok(user)
    }

    /// Get a user by name, case-insensitively.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(sql::SELECT_USER_BY_NAME)
            .bind(username.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query user by name")?;

        let user = match row {
            Some(row) => Some(User {
                user_id: row.get("user_id"),
                username: row.get("username"),
                username_lower: row.get("username_lower"),
                has_avatar: row.get("has_avatar"),
                created_at: DateTime::parse_from_rfc3339(row.get("created_at"))
                    .context("Invalid created_at timestamp")?
                    .with_timezone(&Utc),
            }),
            None => None,
        };

        Ok(user)
    }

    /// List all users, ordered by name.
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(sql::SELECT_ALL_USERS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().filter_map(row_to_user).collect())
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query(sql::COUNT_USERS)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(row.get("n"))
    }

    /// Change a user's display name (the lowercased copy follows).
    ///
    /// Returns false if the user does not exist. Renaming onto a name
    /// another user already holds fails the unique constraint; callers
    /// should check with [`UserStore::get_by_username`] first to report it
    /// nicely.
    pub async fn rename(&self, user_id: i64, new_username: &str) -> Result<bool> {
        let result = sqlx::query(sql::UPDATE_USERNAME)
            .bind(new_username)
            .bind(new_username.to_lowercase())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to rename user")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user and every run they submitted.
    pub async fn delete(&self, user_id: i64) -> Result<bool> {
        // First delete the user's runs, then the user itself
        sqlx::query(sql::DELETE_RUNS_FOR_USER)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user's runs")?;

        let result = sqlx::query(sql::DELETE_USER)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    /// Store a user's avatar image.
    pub async fn set_avatar(&self, user_id: i64, data: Vec<u8>, mime: &str) -> Result<bool> {
        let result = sqlx::query(sql::SET_AVATAR)
            .bind(data)
            .bind(mime)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to store avatar")?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a user's avatar image.
    pub async fn clear_avatar(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query(sql::CLEAR_AVATAR)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear avatar")?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a user's avatar bytes and MIME type, if one is set.
    pub async fn avatar(&self, user_id: i64) -> Result<Option<(Vec<u8>, String)>> {
        let row = sqlx::query(sql::SELECT_AVATAR)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query avatar")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: Option<Vec<u8>> = row.get("avatar");
        let mime: Option<String> = row.get("avatar_mime");

        Ok(data.map(|data| {
            (
                data,
                mime.unwrap_or_else(|| "application/octet-stream".to_string()),
            )
        }))
    }
}

/// Convert a database row to a User, dropping rows with bad timestamps.
fn row_to_user(row: crate::db::DbRow) -> Option<User> {
    let user_id: i64 = row.try_get("user_id").ok()?;
    let created_at_str: String = row.try_get("created_at").ok()?;

    let created_at = match DateTime::parse_from_rfc3339(&created_at_str) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!("Failed to parse created_at for user {}: {}", user_id, e);
            return None;
        }
    };

    Some(User {
        user_id,
        username: row.try_get("username").ok()?,
        username_lower: row.try_get("username_lower").ok()?,
        has_avatar: row.try_get("has_avatar").ok()?,
        created_at,
    })
}
