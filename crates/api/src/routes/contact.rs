//! Public contact form.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::validation::require_text;
use bazaar_core::{Email, ValidationErrors};

use crate::db::ContactRepository;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::models::ContactMessage;
use crate::state::AppState;

const MAX_NAME_CHARS: usize = 150;
const MAX_MESSAGE_CHARS: usize = 2000;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Store a contact message for staff.
///
/// POST /contact/
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<ContactForm>,
) -> Result<(StatusCode, Json<ContactMessage>)> {
    let mut errors = ValidationErrors::new();
    let name = require_text(&mut errors, "name", &form.name, MAX_NAME_CHARS);
    let message = require_text(&mut errors, "message", &form.message, MAX_MESSAGE_CHARS);
    let email = Email::parse(&form.email).ok();
    if email.is_none() {
        errors.add("email", "Enter a valid email address.");
    }

    let (Some(name), Some(email), Some(message)) = (name, email, message) else {
        return Err(errors.into());
    };

    let saved = ContactRepository::new(state.pool())
        .create(&name, &email, &message)
        .await?;
    tracing::info!(contact_id = %saved.id, "Contact message received");

    Ok((StatusCode::CREATED, Json(saved)))
}
