use crate::models::events::UserRegistered;
use crate::models::user::{
    NewUser, User, PROFILE_STATUS_CREATED, PROFILE_STATUS_FAILED, PROFILE_STATUS_PENDING,
};
use crate::repositories::{RepositoryError, UserRepository};
use crate::services::confirmation_service::{ConfirmationError, ConfirmationService};
use crate::services::event_publisher::{publish_json, EventPublisher};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password too weak (minimum 8 characters)")]
    WeakPassword,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    #[error("Confirmation error: {0}")]
    ConfirmationError(#[from] ConfirmationError),
}

pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// A freshly stored user together with the code that will verify it.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: User,
    pub code: crate::models::ConfirmationCode,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    confirmation_service: Arc<ConfirmationService>,
    publisher: Arc<dyn EventPublisher>,
    registered_topic: String,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        confirmation_service: Arc<ConfirmationService>,
        publisher: Arc<dyn EventPublisher>,
        registered_topic: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            confirmation_service,
            publisher,
            registered_topic: registered_topic.into(),
        }
    }

    /// Store a new unverified user, issue its confirmation code and announce it.
    ///
    /// The event is only published once both the user and the code are stored.
    pub async fn register_user(
        &self,
        request: RegisterUserRequest,
    ) -> Result<RegisteredUser, UserServiceError> {
        let email = request.email.trim().to_lowercase();
        self.validate_email(&email)?;
        self.validate_password(&request.password)?;

        let password_hash = self.hash_password(&request.password)?;

        let new_user = NewUser {
            email,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            username: request.username,
            profile_status: PROFILE_STATUS_PENDING.to_string(),
        };

        let user = match self.repository.create_user(new_user).await {
            Ok(user) => user,
            Err(RepositoryError::AlreadyExists) => return Err(UserServiceError::EmailTaken),
            Err(e) => return Err(UserServiceError::RepositoryError(e)),
        };

        let code = self.confirmation_service.issue_code(&user).await?;

        let event = UserRegistered {
            user_id: user.id,
            email: user.email.clone(),
            code: code.code.clone(),
            expires_at: code.expires_at,
        };
        publish_json(self.publisher.as_ref(), &self.registered_topic, &event);

        tracing::info!(user_id = user.id, "User registered");
        Ok(RegisteredUser { user, code })
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .repository
            .find_by_email(&email.trim().to_lowercase())
            .await?)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn update_profile_status(
        &self,
        user_id: i64,
        status: &str,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        user.profile_status = status.to_string();

        match self.repository.save(user).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// React to the downstream profile service reporting whether it created
    /// a profile for `user_id`. Unknown users are ignored.
    pub async fn handle_profile_creation_event(
        &self,
        user_id: i64,
        created: bool,
    ) -> Result<(), UserServiceError> {
        let status = if created {
            PROFILE_STATUS_CREATED
        } else {
            PROFILE_STATUS_FAILED
        };

        match self.update_profile_status(user_id, status).await {
            Ok(_) => Ok(()),
            Err(UserServiceError::UserNotFound) => {
                tracing::warn!(user_id, "Profile creation event for unknown user");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn validate_email(&self, email: &str) -> Result<(), UserServiceError> {
        if !email.contains('@') || email.len() > 255 || email.is_empty() {
            return Err(UserServiceError::InvalidEmail);
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), UserServiceError> {
        if password.len() < 8 {
            return Err(UserServiceError::WeakPassword);
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, UserServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserServiceError::HashingError(e.to_string()))
    }
}
