pub mod test_helpers {
    use crate::services::EventPublisher;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::sync::Mutex;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        // A single connection that never recycles, so the in-memory database
        // lives as long as the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
        verified: bool,
    ) -> Result<i64, sqlx::Error> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
            })?
            .to_string();

        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, email_verified) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(verified)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert a confirmation code directly, bypassing the engine.
    pub async fn insert_test_code(
        pool: &SqlitePool,
        user_id: i64,
        code: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO confirmation_codes (code, user_id, expires_at) VALUES (?, ?, ?)",
        )
        .bind(code)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Publisher that keeps every `(topic, payload)` pair it receives.
    #[derive(Default)]
    pub struct RecordingPublisher {
        events: Mutex<Vec<(String, String)>>,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<(String, String)> {
            match self.events.lock() {
                Ok(events) => events.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        }

        pub fn events_for(&self, topic: &str) -> Vec<serde_json::Value> {
            self.events()
                .into_iter()
                .filter(|(t, _)| t == topic)
                .filter_map(|(_, payload)| serde_json::from_str(&payload).ok())
                .collect()
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, topic: &str, payload: String) {
            let mut events = match self.events.lock() {
                Ok(events) => events,
                Err(poisoned) => poisoned.into_inner(),
            };
            events.push((topic.to_string(), payload));
        }
    }
}
