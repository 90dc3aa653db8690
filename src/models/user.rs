use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const PROFILE_STATUS_PENDING: &str = "PENDING";
pub const PROFILE_STATUS_CREATED: &str = "CREATED";
pub const PROFILE_STATUS_FAILED: &str = "FAILED";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub profile_status: String,
    pub email_verified: bool,
    pub created_at: Option<String>,
}

/// Fields required to insert a user; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub profile_status: String,
}
