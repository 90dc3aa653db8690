//! Payloads of the domain events published on user state changes.
//!
//! Each payload is serialized to JSON and handed to an
//! [`EventPublisher`](crate::services::event_publisher::EventPublisher)
//! under its topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TOPIC_USER_REGISTERED: &str = "user.registered";
pub const TOPIC_CONFIRMATION_CODE_RENEWED: &str = "user.confirmation-code.renewed";

/// Emitted once a new user has been stored and given a confirmation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub user_id: i64,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Emitted after a missing or expired code has been replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationCodeRenewed {
    pub user_id: i64,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}
