//! Authentication route handlers.
//!
//! Registration logs the new user in immediately; login rotates the session
//! identity. Both store only the minimal [`CurrentUser`] in the session.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use bramble_core::UserId;

use crate::error::{ApiError, Result};
use crate::models::{CurrentUser, User, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User response body.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

async fn store_identity(session: &Session, user: &User) -> Result<()> {
    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(user))
        .await
        .map_err(|e| ApiError::Internal(format!("failed to persist session: {e}")))
}

/// Register a new user and log them in.
#[instrument(skip(state, session, body), fields(username = %body.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = AuthService::new(state.pool())
        .register(&body.username, &body.password)
        .await?;

    store_identity(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log an existing user in.
#[instrument(skip(state, session, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool())
        .login(&body.username, &body.password)
        .await?;

    // Rotate the session ID on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to rotate session: {e}")))?;
    store_identity(&session, &user).await?;

    Ok(Json(user.into()))
}

/// Log the current user out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to clear session: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}
