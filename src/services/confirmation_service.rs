use crate::config::{ConfirmationSettings, ConsumedCodePolicy};
use crate::models::confirmation_code::{ConfirmationCode, NewConfirmationCode};
use crate::models::events::ConfirmationCodeRenewed;
use crate::models::user::User;
use crate::repositories::{
    ConfirmationCodeRepository, RepositoryError, UserRepository,
};
use crate::services::event_publisher::{publish_json, EventPublisher};
use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

/// Bytes of OS randomness behind each code (hex encoded to twice as many chars).
const CODE_BYTES: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),
    #[error("Could not generate an unused confirmation code after {0} attempts")]
    CodeSpaceExhausted(u32),
    #[error("Confirmation code lifetime overflows the representable time range")]
    ExpiryOutOfRange,
}

/// Result of checking a code, before it is collapsed to a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    Expired,
    Unknown,
}

/// What a renewal request ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum RenewalOutcome {
    UserNotFound,
    StillValid,
    Renewed(ConfirmationCode),
    /// A concurrent renewal stored a code for this user first.
    Superseded,
    Failed,
}

pub struct ConfirmationService {
    user_repository: Arc<dyn UserRepository>,
    code_repository: Arc<dyn ConfirmationCodeRepository>,
    publisher: Arc<dyn EventPublisher>,
    settings: ConfirmationSettings,
}

impl ConfirmationService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        code_repository: Arc<dyn ConfirmationCodeRepository>,
        publisher: Arc<dyn EventPublisher>,
        settings: ConfirmationSettings,
    ) -> Self {
        Self {
            user_repository,
            code_repository,
            publisher,
            settings,
        }
    }

    pub fn settings(&self) -> &ConfirmationSettings {
        &self.settings
    }

    fn generate_code() -> String {
        let mut bytes = [0u8; CODE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Store a fresh code for `user`, expiring one TTL from now.
    ///
    /// Publishes nothing; callers decide which event follows.
    pub async fn issue_code(&self, user: &User) -> Result<ConfirmationCode, ConfirmationError> {
        let attempts = self.settings.max_generation_attempts.max(1);

        for attempt in 1..=attempts {
            let expires_at = Utc::now()
                .checked_add_signed(self.settings.code_ttl)
                .ok_or(ConfirmationError::ExpiryOutOfRange)?;
            let new_code = NewConfirmationCode {
                code: Self::generate_code(),
                user_id: user.id,
                expires_at,
            };

            match self.code_repository.save(new_code).await {
                Ok(code) => {
                    tracing::debug!(user_id = user.id, expires_at = %code.expires_at, "Confirmation code issued");
                    return Ok(code);
                }
                Err(RepositoryError::DuplicateCode) => {
                    tracing::warn!(user_id = user.id, attempt, "Confirmation code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ConfirmationError::CodeSpaceExhausted(attempts))
    }

    /// Classify `code` and apply its side effects.
    ///
    /// Expired codes are deleted on the first attempt; a valid code marks its
    /// owner verified and is then retained or deleted per policy.
    pub async fn check_code(&self, code: &str) -> Result<VerificationOutcome, ConfirmationError> {
        let Some(record) = self.code_repository.find_by_code(code).await? else {
            return Ok(VerificationOutcome::Unknown);
        };

        if record.is_expired_at(Utc::now()) {
            let removed = self.code_repository.delete(record.id).await?;
            tracing::info!(user_id = record.user_id, removed, "Expired confirmation code rejected");
            return Ok(VerificationOutcome::Expired);
        }

        let Some(mut user) = self.user_repository.find_by_id(record.user_id).await? else {
            tracing::warn!(user_id = record.user_id, "Confirmation code owner no longer exists");
            return Ok(VerificationOutcome::Unknown);
        };

        user.email_verified = true;
        self.user_repository.save(user).await?;

        if self.settings.consumed_code_policy == ConsumedCodePolicy::Delete {
            self.code_repository.delete(record.id).await?;
        }

        tracing::info!(user_id = record.user_id, "Email address verified");
        Ok(VerificationOutcome::Verified)
    }

    /// Returns `true` only when the code was valid and its owner is now verified.
    ///
    /// Unknown and expired codes are indistinguishable to the caller.
    pub async fn verify_code(&self, code: &str) -> Result<bool, ConfirmationError> {
        let outcome = self.check_code(code).await?;
        Ok(outcome == VerificationOutcome::Verified)
    }

    /// Replace a missing or expired code and announce the new one.
    ///
    /// Never fails: store errors are logged and reported as
    /// [`RenewalOutcome::Failed`].
    pub async fn renew_confirmation_code(&self, user_id: i64) -> RenewalOutcome {
        match self.try_renew(user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Confirmation code renewal failed");
                RenewalOutcome::Failed
            }
        }
    }

    async fn try_renew(&self, user_id: i64) -> Result<RenewalOutcome, ConfirmationError> {
        let Some(user) = self.user_repository.find_by_id(user_id).await? else {
            tracing::debug!(user_id, "Renewal requested for unknown user, ignoring");
            return Ok(RenewalOutcome::UserNotFound);
        };

        if let Some(existing) = self.code_repository.find_by_user(user.id).await? {
            if existing.is_valid_at(Utc::now()) {
                tracing::debug!(user_id, "Confirmation code still valid, renewal skipped");
                return Ok(RenewalOutcome::StillValid);
            }
            self.code_repository.delete(existing.id).await?;
        }

        let code = match self.issue_code(&user).await {
            Ok(code) => code,
            Err(ConfirmationError::Store(RepositoryError::AlreadyExists)) => {
                tracing::info!(user_id, "Confirmation code renewed concurrently, skipping publish");
                return Ok(RenewalOutcome::Superseded);
            }
            Err(e) => return Err(e),
        };

        let event = ConfirmationCodeRenewed {
            user_id: user.id,
            email: user.email.clone(),
            code: code.code.clone(),
            expires_at: code.expires_at,
        };
        publish_json(self.publisher.as_ref(), &self.settings.renewed_topic, &event);

        tracing::info!(user_id, "Confirmation code renewed");
        Ok(RenewalOutcome::Renewed(code))
    }

    /// Delete every code past its deadline.
    pub async fn purge_expired_codes(&self) -> Result<u64, ConfirmationError> {
        let removed = self.code_repository.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired confirmation codes");
        }
        Ok(removed)
    }
}
