//! Environment-driven service configuration.
//!
//! Every setting has a default so a bare `DATABASE_URL` is enough to boot.
//! Values that fail to parse fall back to the default with a warning.

use chrono::Duration;
use std::env;
use std::str::FromStr;
use tracing::warn;

use crate::models::events::{TOPIC_CONFIRMATION_CODE_RENEWED, TOPIC_USER_REGISTERED};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_CODE_TTL_SECS: i64 = 3600;
/// Longest accepted code lifetime: 30 days.
pub const MAX_CODE_TTL_SECS: i64 = 30 * 24 * 3600;
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 5;
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;
pub const DEFAULT_RENEWAL_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 600;

/// What happens to a code row once it has verified its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumedCodePolicy {
    /// Leave the row in place; it expires and is purged like any other code.
    #[default]
    Retain,
    /// Delete the row as part of a successful verification.
    Delete,
}

impl FromStr for ConsumedCodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(ConsumedCodePolicy::Retain),
            "delete" => Ok(ConsumedCodePolicy::Delete),
            other => Err(format!(
                "Invalid consumed code policy: {}. Use 'retain' or 'delete'",
                other
            )),
        }
    }
}

/// Settings consumed by the confirmation engine.
#[derive(Debug, Clone)]
pub struct ConfirmationSettings {
    pub code_ttl: Duration,
    pub consumed_code_policy: ConsumedCodePolicy,
    pub max_generation_attempts: u32,
    pub renewed_topic: String,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            code_ttl: Duration::seconds(DEFAULT_CODE_TTL_SECS),
            consumed_code_policy: ConsumedCodePolicy::default(),
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
            renewed_topic: TOPIC_CONFIRMATION_CODE_RENEWED.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub confirmation: ConfirmationSettings,
    pub registered_topic: String,
    pub event_bus_capacity: usize,
    pub renewal_queue_capacity: usize,
    /// `None` disables the periodic purge of expired codes.
    pub purge_interval: Option<std::time::Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            confirmation: ConfirmationSettings::default(),
            registered_topic: TOPIC_USER_REGISTERED.to_string(),
            event_bus_capacity: DEFAULT_EVENT_BUS_CAPACITY,
            renewal_queue_capacity: DEFAULT_RENEWAL_QUEUE_CAPACITY,
            purge_interval: Some(std::time::Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECS)),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let ttl_secs = parse_env("CONFIRMATION_CODE_TTL_SECS", DEFAULT_CODE_TTL_SECS);

        let confirmation = ConfirmationSettings {
            code_ttl: code_ttl_from_secs(ttl_secs),
            consumed_code_policy: parse_env(
                "CONFIRMATION_CONSUMED_CODE_POLICY",
                ConsumedCodePolicy::default(),
            ),
            max_generation_attempts: parse_env(
                "CONFIRMATION_MAX_GENERATION_ATTEMPTS",
                DEFAULT_MAX_GENERATION_ATTEMPTS,
            )
            .max(1),
            renewed_topic: env::var("EVENT_TOPIC_CODE_RENEWED")
                .unwrap_or_else(|_| TOPIC_CONFIRMATION_CODE_RENEWED.to_string()),
        };

        let purge_secs = parse_env(
            "CONFIRMATION_PURGE_INTERVAL_SECS",
            DEFAULT_PURGE_INTERVAL_SECS,
        );

        Self {
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            confirmation,
            registered_topic: env::var("EVENT_TOPIC_USER_REGISTERED")
                .unwrap_or_else(|_| TOPIC_USER_REGISTERED.to_string()),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", DEFAULT_EVENT_BUS_CAPACITY).max(1),
            renewal_queue_capacity: parse_env(
                "RENEWAL_QUEUE_CAPACITY",
                DEFAULT_RENEWAL_QUEUE_CAPACITY,
            )
            .max(1),
            purge_interval: (purge_secs > 0).then(|| std::time::Duration::from_secs(purge_secs)),
        }
    }
}

/// Seconds outside `1..=MAX_CODE_TTL_SECS` fall back to the default.
fn code_ttl_from_secs(secs: i64) -> Duration {
    let ttl = (1..=MAX_CODE_TTL_SECS)
        .contains(&secs)
        .then(|| Duration::try_seconds(secs))
        .flatten();

    match ttl {
        Some(ttl) => ttl,
        None => {
            warn!(
                "CONFIRMATION_CODE_TTL_SECS must be between 1 and {}, got {}. Using default {}",
                MAX_CODE_TTL_SECS, secs, DEFAULT_CODE_TTL_SECS
            );
            Duration::seconds(DEFAULT_CODE_TTL_SECS)
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid {} ({}): {}. Using default {:?}", key, raw, e, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parses_case_insensitively() {
        assert_eq!(
            "Delete".parse::<ConsumedCodePolicy>(),
            Ok(ConsumedCodePolicy::Delete)
        );
        assert_eq!(
            " retain ".parse::<ConsumedCodePolicy>(),
            Ok(ConsumedCodePolicy::Retain)
        );
        assert!("archive".parse::<ConsumedCodePolicy>().is_err());
    }

    #[test]
    fn test_code_ttl_out_of_range_uses_default() {
        let default = Duration::seconds(DEFAULT_CODE_TTL_SECS);
        assert_eq!(code_ttl_from_secs(0), default);
        assert_eq!(code_ttl_from_secs(-5), default);
        assert_eq!(code_ttl_from_secs(MAX_CODE_TTL_SECS + 1), default);
        assert_eq!(code_ttl_from_secs(1_000_000_000_000_000), default);
        assert_eq!(code_ttl_from_secs(i64::MAX), default);
        assert_eq!(
            code_ttl_from_secs(MAX_CODE_TTL_SECS),
            Duration::days(30)
        );
        assert_eq!(code_ttl_from_secs(120), Duration::minutes(2));
    }

    #[test]
    fn test_default_ttl_is_one_hour() {
        let settings = ConfirmationSettings::default();
        assert_eq!(settings.code_ttl, Duration::hours(1));
        assert_eq!(settings.consumed_code_policy, ConsumedCodePolicy::Retain);
    }
}
