//! Authentication error types.

use thiserror::Error;

use bazaar_core::ValidationErrors;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request fields failed validation.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationErrors),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session refers to a user that no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
