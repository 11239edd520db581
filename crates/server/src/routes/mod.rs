//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                   - Liveness
//! GET    /health/ready                             - Readiness (database)
//!
//! # Auth
//! POST   /api/auth/register                        - Create account
//! POST   /api/auth/sign-in                         - Sign in
//! POST   /api/auth/sign-out                        - Sign out
//! GET    /api/auth/session                         - Current identity
//!
//! # Onboarding & settings
//! POST   /api/onboarding/role                      - Choose role
//! POST   /api/onboarding/student                   - Student profile
//! POST   /api/onboarding/institution               - Register institution
//! POST   /api/user/update                          - Settings
//!
//! # Institutions (admin unless noted)
//! GET    /api/institutions                         - Directory (any user)
//! PUT    /api/institutions/{id}/settings           - Update settings
//! GET    /api/institutions/{id}/students/{sid}     - Student details
//! POST   /api/institutions/{id}/therapists         - Add therapist
//! DELETE /api/institutions/{id}/therapists/{tid}   - Remove therapist
//! POST   /api/institutions/{id}/bookings/{bid}/confirm - Confirm booking
//!
//! # Students
//! GET    /api/therapists                           - Caller's institution roster
//! GET    /api/bookings                             - Caller's bookings
//! POST   /api/bookings                             - Book a session
//! GET    /api/assessments/{instrument}/questions   - Questionnaire
//! POST   /api/assessments                          - Submit answers
//! GET    /api/dashboard/student                    - Student dashboard
//! GET    /api/dashboard/institution                - Admin dashboard
//! GET    /api/analytics                            - Institution analytics
//!
//! # Chat
//! GET    /api/chat/history                         - Transcript
//! POST   /api/chat/messages                        - One chat turn
//! POST   /api/chat/save                            - Replace transcript
//! DELETE /api/chat/clear                           - Delete transcript
//!
//! # Forum
//! GET    /api/forum/posts?sort=latest|top          - List posts
//! POST   /api/forum/posts                          - New post
//! GET    /api/forum/posts/{id}                     - Post with replies
//! POST   /api/forum/posts/{id}/replies             - Reply
//! POST   /api/forum/posts/{id}/upvote              - Upvote
//!
//! # Resources
//! GET    /api/resources/crisis                     - Emergency contacts
//! ```

pub mod assessments;
pub mod auth;
pub mod bookings;
pub mod chat;
pub mod dashboard;
pub mod forum;
pub mod health;
pub mod institutions;
pub mod onboarding;
pub mod resources;

use axum::{
    Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    routing::{delete, get, post, put},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejection is an [`AppError::Validation`], so
/// malformed bodies get the same `{"error": ...}` shape as everything else.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> AppError {
    AppError::validation(rejection.body_text())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/session", get(auth::session))
}

fn onboarding_routes() -> Router<AppState> {
    Router::new()
        .route("/role", post(onboarding::choose_role))
        .route("/student", post(onboarding::student))
        .route("/institution", post(onboarding::institution))
}

fn institution_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(institutions::index))
        .route("/{id}/settings", put(institutions::update_settings))
        .route(
            "/{id}/students/{student_id}",
            get(institutions::student_details),
        )
        .route("/{id}/therapists", post(institutions::add_therapist))
        .route(
            "/{id}/therapists/{therapist_id}",
            delete(institutions::remove_therapist),
        )
        .route(
            "/{id}/bookings/{booking_id}/confirm",
            post(institutions::confirm_booking),
        )
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(chat::history))
        .route("/messages", post(chat::send_message))
        .route("/save", post(chat::save))
        .route("/clear", delete(chat::clear))
}

fn forum_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(forum::index).post(forum::create))
        .route("/posts/{id}", get(forum::show))
        .route("/posts/{id}/replies", post(forum::reply))
        .route("/posts/{id}/upvote", post(forum::upvote))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/onboarding", onboarding_routes())
        .route("/user/update", post(onboarding::update_user))
        .nest("/institutions", institution_routes())
        .route("/therapists", get(institutions::therapists))
        .route("/bookings", get(bookings::index).post(bookings::create))
        .route(
            "/assessments/{instrument}/questions",
            get(assessments::questions),
        )
        .route("/assessments", post(assessments::submit))
        .route("/dashboard/student", get(dashboard::student))
        .route("/dashboard/institution", get(dashboard::institution))
        .route("/analytics", get(dashboard::analytics))
        .nest("/chat", chat_routes())
        .nest("/forum", forum_routes())
        .route("/resources/crisis", get(resources::crisis))
}

/// All application routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/api", api_routes())
}
