//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bz-cli migrate
//! ```
//!
//! Applies `crates/api/migrations/` in order. Already applied migrations are
//! skipped, so the command is safe to re-run.

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
