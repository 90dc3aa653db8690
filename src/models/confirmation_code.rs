use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A one-time code proving control of the owning user's email address.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ConfirmationCode {
    pub id: i64,
    pub code: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: Option<String>,
}

impl ConfirmationCode {
    /// A code is accepted only strictly before its deadline.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_valid_at(now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConfirmationCode {
    pub code: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}
