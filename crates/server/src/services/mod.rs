//! Business logic services.
//!
//! Services borrow their stores and are generic over the store traits in
//! [`crate::db`], so they run unchanged against `PostgreSQL` or in-memory
//! fakes. Every operation on another user's or institution's data takes a
//! [`RequestContext`](calmly_core::RequestContext) and checks it before
//! touching storage.
//!
//! # Services
//!
//! - `auth` - Password registration and sign-in
//! - `onboarding` - Role choice, student profile, institution registration
//! - `chat` - Crisis-aware chat turns with generation fallback
//! - `assessments` - PHQ-9 / GAD-7 submission
//! - `analytics` - Institution-wide screening aggregates
//! - `institutions`, `therapists`, `bookings` - Institution management
//! - `dashboard` - Student and admin landing pages
//! - `forum` - Anonymous peer-support posts

pub mod analytics;
pub mod assessments;
pub mod auth;
pub mod bookings;
pub mod chat;
pub mod dashboard;
pub mod forum;
pub mod institutions;
pub mod onboarding;
pub mod therapists;

pub use analytics::AnalyticsService;
pub use assessments::AssessmentService;
pub use auth::{AuthError, AuthService};
pub use bookings::BookingService;
pub use chat::ChatOrchestrator;
pub use dashboard::DashboardService;
pub use forum::ForumService;
pub use institutions::InstitutionService;
pub use onboarding::OnboardingService;
pub use therapists::TherapistService;
