//! Customer account commands.
//!
//! # Usage
//!
//! ```bash
//! bz-cli user create -e jane@example.com -p 's3cret-pass' --first-name Jane --last-name Doe
//! ```

use bazaar_api::services::AuthService;
use bazaar_api::services::auth::Registration;

/// Create a customer account with the same rules as `POST /auth/register/`.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let registration = Registration {
        email: email.to_owned(),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        password: password.to_owned(),
        password_confirm: password.to_owned(),
    };

    let user = AuthService::new(&pool).register(&registration).await?;
    tracing::info!("Created user {} ({})", user.email, user.id);
    Ok(())
}
