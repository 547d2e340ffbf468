//! Authentication service.
//!
//! Email and password accounts with Argon2 password hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::validation::{check_max_chars, require_text};
use bazaar_core::{Email, UserId, ValidationErrors};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, ProfileChanges, UserRepository};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest accepted first or last name.
const MAX_NAME_CHARS: usize = 150;

/// Longest accepted phone number.
const MAX_PHONE_CHARS: usize = 32;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Profile update request; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` with field-keyed messages for bad input,
    /// including an already registered email.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();

        let email = match Email::parse(&registration.email) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.add("email", "Enter a valid email address.");
                None
            }
        };
        let first_name = require_text(&mut errors, "first_name", &registration.first_name, MAX_NAME_CHARS);
        let last_name = require_text(&mut errors, "last_name", &registration.last_name, MAX_NAME_CHARS);

        if let Err(message) = validate_password(&registration.password) {
            errors.add("password", message);
        } else if registration.password != registration.password_confirm {
            errors.add("password", "Passwords do not match");
        }

        let (Some(email), Some(first_name), Some(last_name)) = (email, first_name, last_name)
        else {
            return Err(errors.into());
        };
        errors.into_result(())?;

        let password_hash = hash_password(&registration.password)?;

        let user = self
            .users
            .create(&NewUser {
                email: &email,
                first_name: &first_name,
                last_name: &last_name,
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::Invalid(ValidationErrors::single(
                    "email",
                    "User with this email already exists.",
                )),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// The user behind a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account was deleted.
    pub async fn profile(&self, id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update name and phone fields.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` for blank names or over-long values.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();
        let mut changes = ProfileChanges::default();

        if let Some(first_name) = &update.first_name {
            changes.first_name = require_text(&mut errors, "first_name", first_name, MAX_NAME_CHARS);
        }
        if let Some(last_name) = &update.last_name {
            changes.last_name = require_text(&mut errors, "last_name", last_name, MAX_NAME_CHARS);
        }
        if let Some(phone) = &update.phone_number {
            let phone = phone.trim();
            if check_max_chars(&mut errors, "phone_number", phone, MAX_PHONE_CHARS) {
                changes.phone_number = Some(phone.to_owned());
            }
        }
        errors.into_result(())?;

        self.users
            .update_profile(id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Replace the password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` keyed `old_password` if the current
    /// password is wrong, or keyed `new_password` if the new one is too weak.
    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .get_password_hash_by_id(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        match verify_password(old_password, &current_hash) {
            Ok(()) => {}
            Err(AuthError::InvalidCredentials) => {
                return Err(ValidationErrors::single("old_password", "Wrong password.").into());
            }
            Err(other) => return Err(other),
        }

        validate_password(new_password)
            .map_err(|message| ValidationErrors::single("new_password", message))?;

        let new_hash = hash_password(new_password)?;
        self.users.set_password_hash(id, &new_hash).await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password strength, returning a user-facing message on failure.
fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
