//! Account handlers: registration, session login/logout, profile and
//! password changes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::JsonBody;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Profile};
use crate::services::AuthService;
use crate::services::auth::{ProfileUpdate, Registration};
use crate::state::AppState;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// POST /auth/register/
#[instrument(skip(state, registration))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(registration): JsonBody<Registration>,
) -> Result<(StatusCode, Json<Profile>)> {
    let user = AuthService::new(state.pool()).register(&registration).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in and start a session.
///
/// POST /auth/login/
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<Profile>> {
    let user = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(user.into()))
}

/// POST /auth/logout/
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/profile/
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let user = AuthService::new(state.pool()).profile(user.id).await?;
    Ok(Json(user.into()))
}

/// PATCH /auth/profile/
#[instrument(skip(state, update), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let user = AuthService::new(state.pool())
        .update_profile(user.id, &update)
        .await?;
    Ok(Json(user.into()))
}

/// POST /auth/change-password/
#[instrument(skip(state, request), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(user.id, &request.old_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
