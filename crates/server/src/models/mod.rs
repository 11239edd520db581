//! Domain models for the Calmly server.
//!
//! API-facing types serialize in camelCase to match the web client.

pub mod booking;
pub mod chat;
pub mod forum;
pub mod institution;
pub mod score;
pub mod session;
pub mod therapist;
pub mod user;

pub use booking::{Booking, NewBooking};
pub use chat::ChatMessage;
pub use forum::{ForumPost, ForumReply, ForumSort, NewForumPost, NewForumReply};
pub use institution::{Institution, InstitutionSettings, InstitutionSummary, NewInstitution};
pub use score::{NewScore, StoredScore};
pub use session::{CurrentUser, keys as session_keys};
pub use therapist::{NewTherapist, Therapist};
pub use user::{NewUser, ProfileUpdate, StudentProfile, StudentSummary, User};
