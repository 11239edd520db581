//! Authentication extractors.
//!
//! [`RequireAuth`] only proves a session exists. [`Caller`] additionally
//! re-reads the account so role and institution are never stale: both
//! change during onboarding while the session lives on.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use calmly_core::RequestContext;

use crate::db::UserStore;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in session.
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AppError::Unauthenticated)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self(user))
    }
}

/// The signed-in account plus its request-scoped authorization context.
pub struct Caller {
    pub user: User,
    pub context: RequestContext,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(current) = RequireAuth::from_request_parts(parts, state).await?;

        // A session whose account was deleted is treated as signed out.
        let user = state
            .store()
            .find_user(current.id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        set_sentry_user(user.id);
        tracing::Span::current().record("user_id", user.id.as_i32());

        let context = user.context();
        Ok(Self { user, context })
    }
}

/// Store the signed-in user in the session.
///
/// The session id is cycled first to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
