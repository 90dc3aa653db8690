use crate::models::confirmation_code::{ConfirmationCode, NewConfirmationCode};
use crate::repositories::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmationCodeRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> RepositoryResult<Option<ConfirmationCode>>;
    /// At most one code exists per user.
    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Option<ConfirmationCode>>;
    /// Fails with `AlreadyExists` when the user already owns a code and with
    /// `DuplicateCode` when the code value is taken.
    async fn save(&self, code: NewConfirmationCode) -> RepositoryResult<ConfirmationCode>;
    /// Returns whether a row was removed by this call.
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64>;
}

pub struct SqliteConfirmationCodeRepository {
    pool: SqlitePool,
}

impl SqliteConfirmationCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_insert_error(e: sqlx::Error) -> RepositoryError {
        let message = e.to_string();
        if message.contains("confirmation_codes.code") {
            RepositoryError::DuplicateCode
        } else if message.contains("UNIQUE") {
            RepositoryError::AlreadyExists
        } else if message.contains("FOREIGN KEY") {
            RepositoryError::NotFound
        } else {
            RepositoryError::Database(e)
        }
    }
}

#[async_trait]
impl ConfirmationCodeRepository for SqliteConfirmationCodeRepository {
    async fn find_by_code(&self, code: &str) -> RepositoryResult<Option<ConfirmationCode>> {
        let row = sqlx::query_as::<_, ConfirmationCode>(
            r#"
            SELECT id, code, user_id, expires_at, created_at
            FROM confirmation_codes
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Option<ConfirmationCode>> {
        let row = sqlx::query_as::<_, ConfirmationCode>(
            r#"
            SELECT id, code, user_id, expires_at, created_at
            FROM confirmation_codes
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save(&self, code: NewConfirmationCode) -> RepositoryResult<ConfirmationCode> {
        let result = sqlx::query(
            "INSERT INTO confirmation_codes (code, user_id, expires_at) VALUES (?, ?, ?)",
        )
        .bind(&code.code)
        .bind(code.user_id)
        .bind(code.expires_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_insert_error)?;

        let id = result.last_insert_rowid();
        let row = sqlx::query_as::<_, ConfirmationCode>(
            r#"
            SELECT id, code, user_id, expires_at, created_at
            FROM confirmation_codes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM confirmation_codes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM confirmation_codes WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
