pub mod confirmation_code_repository;
pub mod user_repository;

pub use confirmation_code_repository::{
    ConfirmationCodeRepository, SqliteConfirmationCodeRepository,
};
pub use user_repository::{SqliteUserRepository, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Confirmation code value already in use")]
    DuplicateCode,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
