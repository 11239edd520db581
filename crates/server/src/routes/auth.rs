//! Account registration and session handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use calmly_core::{Email, InstitutionId, UserId, UserRole};

use super::JsonBody;
use crate::error::AppError;
use crate::middleware::{Caller, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// The identity the web client keeps in memory.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Option<UserRole>,
    pub institution_id: Option<InstitutionId>,
}

impl From<&User> for SessionInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            institution_id: user.institution_id,
        }
    }
}

async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(
        session,
        &CurrentUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        },
    )
    .await?;
    Ok(())
}

/// POST /api/auth/register
///
/// Creates the account and signs it in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionInfo>), AppError> {
    let user = AuthService::new(state.store())
        .register(&request.email, &request.name, &request.password)
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Account registered");

    Ok((StatusCode::CREATED, Json(SessionInfo::from(&user))))
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<SignInRequest>,
) -> Result<Json<SessionInfo>, AppError> {
    let user = AuthService::new(state.store())
        .sign_in(&request.email, &request.password)
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Signed in");

    Ok(Json(SessionInfo::from(&user)))
}

/// POST /api/auth/sign-out
pub async fn sign_out(session: Session) -> Result<StatusCode, AppError> {
    clear_current_user(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/session
///
/// Role and institution come from the database, not the session, so the
/// client sees onboarding changes immediately.
pub async fn session(caller: Caller) -> Json<SessionInfo> {
    Json(SessionInfo::from(&caller.user))
}
