//! Contact form messages.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{ContactMessageId, Email};

use super::RepositoryError;
use crate::models::ContactMessage;

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: ContactMessageId,
    name: String,
    email: Email,
    message: String,
    created_at: DateTime<Utc>,
}

pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a message for staff to process.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        message: &str,
    ) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(
            r"
            INSERT INTO shop.contact_message (name, email, message)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, message, created_at
            ",
        )
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(ContactMessage {
            id: row.id,
            name: row.name,
            email: row.email,
            message: row.message,
            created_at: row.created_at,
        })
    }
}
