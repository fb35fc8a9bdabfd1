//! Account records and the refresh token mirrored into them.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    /// Public account identifier, used as the token subject.
    pub uuid: String,
    pub email: String,
    pub password_hash: String,
    /// The single live refresh token, if any.
    pub refresh_token: Option<String>,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account. Returns the row ID.
    pub async fn create(
        &self,
        uuid: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO accounts (uuid, email, password_hash) VALUES (?, ?, ?)")
                .bind(uuid)
                .bind(email)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get an account by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uuid, email, password_hash, refresh_token FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get an account by its public identifier.
    pub async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uuid, email, password_hash, refresh_token FROM accounts WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get an account only if `refresh_token` is its current live token.
    pub async fn find_by_uuid_and_refresh_token(
        &self,
        uuid: &str,
        refresh_token: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uuid, email, password_hash, refresh_token FROM accounts WHERE uuid = ? AND refresh_token = ?",
        )
        .bind(uuid)
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
    }

    /// Unconditionally replace (or clear) the stored refresh token.
    pub async fn set_refresh_token(
        &self,
        uuid: &str,
        refresh_token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET refresh_token = ? WHERE uuid = ?")
            .bind(refresh_token)
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace `current` with `new` only if `current` is still the stored token.
    /// Returns false if another request rotated or cleared it first.
    pub async fn rotate_refresh_token(
        &self,
        uuid: &str,
        current: &str,
        new: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token = ? WHERE uuid = ? AND refresh_token = ?",
        )
        .bind(new)
        .bind(uuid)
        .bind(current)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Clear the stored token if it is still `current`.
    pub async fn clear_refresh_token(&self, uuid: &str, current: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token = NULL WHERE uuid = ? AND refresh_token = ?",
        )
        .bind(uuid)
        .bind(current)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an account by ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
