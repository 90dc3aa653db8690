use std::{collections::HashMap, env};

use serial_test::serial;
use userhub::config::{ConsumedCodePolicy, ServiceConfig, DEFAULT_BIND_ADDRESS};
use userhub::models::events::{TOPIC_CONFIRMATION_CODE_RENEWED, TOPIC_USER_REGISTERED};

const KEYS: &[&str] = &[
    "BIND_ADDRESS",
    "CONFIRMATION_CODE_TTL_SECS",
    "CONFIRMATION_CONSUMED_CODE_POLICY",
    "CONFIRMATION_MAX_GENERATION_ATTEMPTS",
    "EVENT_BUS_CAPACITY",
    "RENEWAL_QUEUE_CAPACITY",
    "CONFIRMATION_PURGE_INTERVAL_SECS",
    "EVENT_TOPIC_USER_REGISTERED",
    "EVENT_TOPIC_CODE_RENEWED",
];

#[derive(Default)]
struct EnvGuard {
    original: HashMap<String, Option<String>>,
}

impl EnvGuard {
    fn clean() -> Self {
        let mut guard = Self::default();
        for key in KEYS {
            guard.remove(key);
        }
        guard
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::set_var(key, value.into());
    }

    fn remove(&mut self, key: &str) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::remove_var(key);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.original.drain() {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
    }
}

#[test]
#[serial]
fn defaults_apply_without_environment() {
    let _guard = EnvGuard::clean();

    let config = ServiceConfig::from_env();

    assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
    assert_eq!(config.confirmation.code_ttl, chrono::Duration::hours(1));
    assert_eq!(
        config.confirmation.consumed_code_policy,
        ConsumedCodePolicy::Retain
    );
    assert_eq!(config.confirmation.max_generation_attempts, 5);
    assert_eq!(config.confirmation.renewed_topic, TOPIC_CONFIRMATION_CODE_RENEWED);
    assert_eq!(config.registered_topic, TOPIC_USER_REGISTERED);
    assert_eq!(config.event_bus_capacity, 1024);
    assert_eq!(config.renewal_queue_capacity, 256);
    assert_eq!(
        config.purge_interval,
        Some(std::time::Duration::from_secs(600))
    );
}

#[test]
#[serial]
fn environment_overrides_are_read() {
    let mut guard = EnvGuard::clean();
    guard.set("BIND_ADDRESS", "127.0.0.1:9000");
    guard.set("CONFIRMATION_CODE_TTL_SECS", "120");
    guard.set("CONFIRMATION_CONSUMED_CODE_POLICY", "delete");
    guard.set("CONFIRMATION_MAX_GENERATION_ATTEMPTS", "3");
    guard.set("RENEWAL_QUEUE_CAPACITY", "16");
    guard.set("CONFIRMATION_PURGE_INTERVAL_SECS", "0");
    guard.set("EVENT_TOPIC_USER_REGISTERED", "accounts.registered");
    guard.set("EVENT_TOPIC_CODE_RENEWED", "accounts.code-renewed");

    let config = ServiceConfig::from_env();

    assert_eq!(config.bind_address, "127.0.0.1:9000");
    assert_eq!(config.confirmation.code_ttl, chrono::Duration::seconds(120));
    assert_eq!(
        config.confirmation.consumed_code_policy,
        ConsumedCodePolicy::Delete
    );
    assert_eq!(config.confirmation.max_generation_attempts, 3);
    assert_eq!(config.renewal_queue_capacity, 16);
    assert_eq!(config.purge_interval, None);
    assert_eq!(config.registered_topic, "accounts.registered");
    assert_eq!(config.confirmation.renewed_topic, "accounts.code-renewed");
}

#[test]
#[serial]
fn invalid_values_fall_back_to_defaults() {
    let mut guard = EnvGuard::clean();
    guard.set("CONFIRMATION_CODE_TTL_SECS", "-5");
    guard.set("CONFIRMATION_CONSUMED_CODE_POLICY", "archive");
    guard.set("EVENT_BUS_CAPACITY", "lots");
    guard.set("CONFIRMATION_MAX_GENERATION_ATTEMPTS", "0");

    let config = ServiceConfig::from_env();

    assert_eq!(config.confirmation.code_ttl, chrono::Duration::hours(1));
    assert_eq!(
        config.confirmation.consumed_code_policy,
        ConsumedCodePolicy::Retain
    );
    assert_eq!(config.event_bus_capacity, 1024);
    assert_eq!(config.confirmation.max_generation_attempts, 1);
}

#[test]
#[serial]
fn oversized_code_ttl_falls_back_to_default() {
    for raw in ["9223372036854775807", "1000000000000000", "2592001"] {
        let mut guard = EnvGuard::clean();
        guard.set("CONFIRMATION_CODE_TTL_SECS", raw);

        let config = ServiceConfig::from_env();

        assert_eq!(config.confirmation.code_ttl, chrono::Duration::hours(1));
    }
}
