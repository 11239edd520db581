//! Integration tests for Calmly.
//!
//! # Running Tests
//!
//! ```bash
//! # Service and router tests (no database needed)
//! cargo test -p calmly-integration-tests
//!
//! # Full HTTP flow against a running server
//! CALMLY_BASE_URL=http://localhost:8080 cargo test -p calmly-integration-tests -- --ignored
//! ```
//!
//! # Test Doubles
//!
//! - [`MemoryStore`] - every store trait over in-process vectors
//! - [`ScriptedGenerator`] - replays queued generation results and counts calls
//! - `calmly_server::random::FixedRandom` - deterministic fallback and alias picks

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use calmly_core::analytics::ScoreRecord;
use calmly_core::{
    BookingId, BookingStatus, Email, ForumPostId, ForumReplyId, Instrument, InstitutionId,
    Responses, ScoreId, TherapistId, UserId, UserRole,
};
use calmly_server::db::institutions::ALREADY_LINKED;
use calmly_server::db::therapists::DUPLICATE_THERAPIST;
use calmly_server::db::{
    BookingStore, ChatHistoryStore, ForumStore, InstitutionStore, RepositoryError, ScoreStore,
    TherapistStore, UserStore,
};
use calmly_server::genai::{GenerationError, TextGenerator};
use calmly_server::models::{
    Booking, ChatMessage, ForumPost, ForumReply, ForumSort, Institution, InstitutionSettings,
    InstitutionSummary, NewBooking, NewForumPost, NewForumReply, NewInstitution, NewScore,
    NewTherapist, NewUser, ProfileUpdate, StoredScore, StudentProfile, Therapist, User,
};

/// Parse a literal address.
#[must_use]
pub fn email(raw: &str) -> Email {
    Email::parse(raw).expect("valid test email")
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
struct Tables {
    users: Vec<(User, String)>,
    institutions: Vec<Institution>,
    therapists: Vec<Therapist>,
    bookings: Vec<Booking>,
    scores: Vec<StoredScore>,
    transcripts: Vec<(UserId, Vec<ChatMessage>)>,
    posts: Vec<(UserId, ForumPost)>,
    replies: Vec<ForumReply>,
    upvotes: HashSet<(ForumPostId, UserId)>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut User, RepositoryError> {
        self.users
            .iter_mut()
            .map(|(user, _)| user)
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn post_view(&self, id: ForumPostId) -> Option<ForumPost> {
        let (_, post) = self.posts.iter().find(|(_, p)| p.id == id)?;
        let replies: Vec<&ForumReply> = self.replies.iter().filter(|r| r.post_id == id).collect();
        let upvotes = self.upvotes.iter().filter(|(post, _)| *post == id).count();

        Some(ForumPost {
            upvotes: i64::try_from(upvotes).unwrap_or(i64::MAX),
            reply_count: i64::try_from(replies.len()).unwrap_or(i64::MAX),
            last_reply_by: replies.last().map(|r| r.author_alias.clone()),
            ..post.clone()
        })
    }
}

/// Every store trait backed by vectors behind one mutex.
///
/// Mirrors the `PostgreSQL` semantics the services rely on: unique e-mails,
/// set-once role and institution links, one upvote per user.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    reject_links: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().expect("store lock poisoned");
        f(&mut tables)
    }

    /// Make every later `link_institution` fail, as a vanished institution
    /// would through its foreign key.
    pub fn reject_institution_links(&self) {
        self.reject_links.store(true, Ordering::SeqCst);
    }

    /// Insert an institution directly.
    pub fn seed_institution(&self, name: &str) -> Institution {
        self.with(|t| {
            let id = t.next_id();
            let institution = Institution {
                id: InstitutionId::new(id),
                name: name.to_string(),
                email: email(&format!("office{id}@example.edu")),
                hod_name: "Dr. Rao".to_string(),
                hod_email: email(&format!("hod{id}@example.edu")),
                hod_phone: "+91 98200 00000".to_string(),
                total_students: None,
                institution_type: None,
                address: None,
                city: None,
                state: None,
                website: None,
                established: None,
                created_at: Utc::now(),
            };
            t.institutions.push(institution.clone());
            institution
        })
    }

    /// Insert an account with a fixed role and institution.
    pub fn seed_user(
        &self,
        address: &str,
        role: Option<UserRole>,
        institution_id: Option<InstitutionId>,
    ) -> User {
        self.with(|t| {
            let id = t.next_id();
            let now = Utc::now();
            let user = User {
                id: UserId::new(id),
                email: email(address),
                name: address.split('@').next().unwrap_or(address).to_string(),
                role,
                institution_id,
                profile: StudentProfile::default(),
                consent_given: role == Some(UserRole::Student),
                created_at: now,
                updated_at: now,
            };
            t.users.push((user.clone(), String::new()));
            user
        })
    }

    pub fn seed_therapist(&self, institution_id: InstitutionId, name: &str) -> Therapist {
        self.with(|t| {
            let id = t.next_id();
            let therapist = Therapist {
                id: TherapistId::new(id),
                institution_id,
                name: name.to_string(),
                email: email(&format!("therapist{id}@example.edu")),
                specialties: vec!["Anxiety".to_string()],
                phone: None,
                created_at: Utc::now(),
            };
            t.therapists.push(therapist.clone());
            therapist
        })
    }

    /// Insert a score with an explicit timestamp.
    pub fn seed_score(
        &self,
        user_id: UserId,
        instrument: Instrument,
        score: i32,
        severity: &str,
        at: DateTime<Utc>,
    ) {
        self.with(|t| {
            let id = t.next_id();
            t.scores.push(StoredScore {
                id: ScoreId::new(id),
                user_id,
                instrument,
                score,
                severity: severity.to_string(),
                responses: Responses::new(),
                created_at: at,
            });
        });
    }

    #[must_use]
    pub fn therapist_count(&self) -> usize {
        self.with(|t| t.therapists.len())
    }

    #[must_use]
    pub fn booking_count(&self) -> usize {
        self.with(|t| t.bookings.len())
    }

    #[must_use]
    pub fn score_count(&self) -> usize {
        self.with(|t| t.scores.len())
    }

    /// The stored transcript, `None` when nothing was ever saved or it was cleared.
    #[must_use]
    pub fn transcript(&self, user_id: UserId) -> Option<Vec<ChatMessage>> {
        self.with(|t| {
            t.transcripts
                .iter()
                .find(|(owner, _)| *owner == user_id)
                .map(|(_, messages)| messages.clone())
        })
    }
}

impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.with(|t| {
            if t.users.iter().any(|(u, _)| u.email == user.email) {
                return Err(RepositoryError::Conflict("email already registered".into()));
            }
            let now = Utc::now();
            let created = User {
                id: UserId::new(t.next_id()),
                email: user.email,
                name: user.name,
                role: None,
                institution_id: None,
                profile: StudentProfile::default(),
                consent_given: false,
                created_at: now,
                updated_at: now,
            };
            t.users.push((created.clone(), user.password_hash));
            Ok(created)
        })
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.with(|t| t.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone())))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self.with(|t| t.users.iter().find(|(u, _)| &u.email == email).cloned()))
    }

    async fn assign_role(&self, id: UserId, role: UserRole) -> Result<bool, RepositoryError> {
        self.with(|t| {
            let user = t.user_mut(id)?;
            if user.role.is_some() {
                return Ok(false);
            }
            user.role = Some(role);
            Ok(true)
        })
    }

    async fn link_institution(
        &self,
        id: UserId,
        institution_id: InstitutionId,
    ) -> Result<bool, RepositoryError> {
        if self.reject_links.load(Ordering::SeqCst) {
            return Err(RepositoryError::NotFound);
        }
        self.with(|t| {
            let user = t.user_mut(id)?;
            if user.institution_id.is_some() {
                return Ok(false);
            }
            user.institution_id = Some(institution_id);
            Ok(true)
        })
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        self.with(|t| {
            let user = t.user_mut(id)?;
            if let Some(name) = &update.name {
                user.name.clone_from(name);
            }
            if let Some(consent) = update.consent_given {
                user.consent_given = consent;
            }

            let p = &update.profile;
            let profile = &mut user.profile;
            profile.student_id = p.student_id.clone().or(profile.student_id.take());
            profile.date_of_birth = p.date_of_birth.or(profile.date_of_birth);
            profile.gender = p.gender.clone().or(profile.gender.take());
            profile.phone_number = p.phone_number.clone().or(profile.phone_number.take());
            profile.emergency_contact = p
                .emergency_contact
                .clone()
                .or(profile.emergency_contact.take());
            profile.emergency_phone = p.emergency_phone.clone().or(profile.emergency_phone.take());
            profile.medical_history = p.medical_history.clone().or(profile.medical_history.take());
            profile.current_medications = p
                .current_medications
                .clone()
                .or(profile.current_medications.take());
            profile.previous_therapy = p.previous_therapy.or(profile.previous_therapy);

            user.updated_at = Utc::now();
            Ok(user.clone())
        })
    }

    async fn list_students(
        &self,
        institution_id: InstitutionId,
    ) -> Result<Vec<User>, RepositoryError> {
        Ok(self.with(|t| {
            let mut students: Vec<User> = t
                .users
                .iter()
                .map(|(u, _)| u)
                .filter(|u| {
                    u.role == Some(UserRole::Student) && u.institution_id == Some(institution_id)
                })
                .cloned()
                .collect();
            students.sort_by(|a, b| a.name.cmp(&b.name));
            students
        }))
    }
}

impl InstitutionStore for MemoryStore {
    async fn create_for_admin(
        &self,
        admin: UserId,
        institution: &NewInstitution,
    ) -> Result<Institution, RepositoryError> {
        self.with(|t| {
            if t.user_mut(admin)?.institution_id.is_some() {
                return Err(RepositoryError::Conflict(ALREADY_LINKED.to_string()));
            }

            let created = Institution {
                id: InstitutionId::new(t.next_id()),
                name: institution.name.clone(),
                email: institution.email.clone(),
                hod_name: institution.hod_name.clone(),
                hod_email: institution.hod_email.clone(),
                hod_phone: institution.hod_phone.clone(),
                total_students: institution.total_students,
                institution_type: institution.institution_type.clone(),
                address: institution.address.clone(),
                city: institution.city.clone(),
                state: institution.state.clone(),
                website: institution.website.clone(),
                established: institution.established,
                created_at: Utc::now(),
            };
            t.institutions.push(created.clone());

            let user = t.user_mut(admin)?;
            user.institution_id = Some(created.id);
            user.role.get_or_insert(UserRole::InstitutionAdmin);
            Ok(created)
        })
    }

    async fn find_institution(
        &self,
        id: InstitutionId,
    ) -> Result<Option<Institution>, RepositoryError> {
        Ok(self.with(|t| t.institutions.iter().find(|i| i.id == id).cloned()))
    }

    async fn list_institutions(&self) -> Result<Vec<InstitutionSummary>, RepositoryError> {
        Ok(self.with(|t| {
            let mut all: Vec<InstitutionSummary> = t
                .institutions
                .iter()
                .map(|i| InstitutionSummary {
                    id: i.id,
                    name: i.name.clone(),
                })
                .collect();
            all.sort_by(|a, b| a.name.cmp(&b.name));
            all
        }))
    }

    async fn update_settings(
        &self,
        id: InstitutionId,
        settings: &InstitutionSettings,
    ) -> Result<Institution, RepositoryError> {
        self.with(|t| {
            let institution = t
                .institutions
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(RepositoryError::NotFound)?;
            institution.name.clone_from(&settings.name);
            institution.email = settings.email.clone();
            institution.hod_name.clone_from(&settings.hod_name);
            institution.hod_email = settings.hod_email.clone();
            institution.hod_phone.clone_from(&settings.hod_phone);
            institution.website.clone_from(&settings.website);
            Ok(institution.clone())
        })
    }
}

impl TherapistStore for MemoryStore {
    async fn add_therapist(
        &self,
        institution_id: InstitutionId,
        therapist: &NewTherapist,
    ) -> Result<Therapist, RepositoryError> {
        self.with(|t| {
            if t.therapists.iter().any(|x| x.email == therapist.email) {
                return Err(RepositoryError::Conflict(DUPLICATE_THERAPIST.to_string()));
            }
            let created = Therapist {
                id: TherapistId::new(t.next_id()),
                institution_id,
                name: therapist.name.clone(),
                email: therapist.email.clone(),
                specialties: therapist.specialties.clone(),
                phone: therapist.phone.clone(),
                created_at: Utc::now(),
            };
            t.therapists.push(created.clone());
            Ok(created)
        })
    }

    async fn find_therapist(&self, id: TherapistId) -> Result<Option<Therapist>, RepositoryError> {
        Ok(self.with(|t| t.therapists.iter().find(|x| x.id == id).cloned()))
    }

    async fn list_therapists(
        &self,
        institution_id: InstitutionId,
    ) -> Result<Vec<Therapist>, RepositoryError> {
        Ok(self.with(|t| {
            t.therapists
                .iter()
                .filter(|x| x.institution_id == institution_id)
                .cloned()
                .collect()
        }))
    }

    async fn delete_therapist(
        &self,
        institution_id: InstitutionId,
        id: TherapistId,
    ) -> Result<bool, RepositoryError> {
        Ok(self.with(|t| {
            let before = t.therapists.len();
            t.therapists
                .retain(|x| !(x.id == id && x.institution_id == institution_id));
            t.therapists.len() != before
        }))
    }
}

impl BookingStore for MemoryStore {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, RepositoryError> {
        self.with(|t| {
            let therapist = t
                .therapists
                .iter()
                .find(|x| x.id == booking.therapist_id)
                .cloned()
                .ok_or(RepositoryError::NotFound)?;
            let created = Booking {
                id: BookingId::new(t.next_id()),
                student_id: booking.student_id,
                therapist_id: therapist.id,
                therapist_name: therapist.name,
                institution_id: therapist.institution_id,
                appointment_at: booking.appointment_at,
                status: BookingStatus::Pending,
                created_at: Utc::now(),
            };
            t.bookings.push(created.clone());
            Ok(created)
        })
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self.with(|t| t.bookings.iter().find(|b| b.id == id).cloned()))
    }

    async fn bookings_for_student(
        &self,
        student_id: UserId,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.with(|t| {
            t.bookings
                .iter()
                .rev()
                .filter(|b| b.student_id == student_id)
                .filter(|b| since.is_none_or(|since| b.created_at >= since))
                .take(usize::try_from(limit).unwrap_or(0))
                .cloned()
                .collect()
        }))
    }

    async fn set_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        self.with(|t| {
            let booking = t
                .bookings
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or(RepositoryError::NotFound)?;
            booking.status = status;
            Ok(booking.clone())
        })
    }
}

impl ScoreStore for MemoryStore {
    async fn insert_score(&self, score: &NewScore) -> Result<StoredScore, RepositoryError> {
        self.with(|t| {
            let stored = StoredScore {
                id: ScoreId::new(t.next_id()),
                user_id: score.user_id,
                instrument: score.instrument,
                score: score.score,
                severity: score.severity.clone(),
                responses: score.responses.clone(),
                created_at: Utc::now(),
            };
            t.scores.push(stored.clone());
            Ok(stored)
        })
    }

    async fn recent_scores(
        &self,
        user_id: UserId,
        instrument: Instrument,
        limit: i64,
    ) -> Result<Vec<StoredScore>, RepositoryError> {
        let mut history = self.score_history(user_id, instrument).await?;
        history.reverse();
        history.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(history)
    }

    async fn score_history(
        &self,
        user_id: UserId,
        instrument: Instrument,
    ) -> Result<Vec<StoredScore>, RepositoryError> {
        Ok(self.with(|t| {
            let mut history: Vec<StoredScore> = t
                .scores
                .iter()
                .filter(|s| s.user_id == user_id && s.instrument == instrument)
                .cloned()
                .collect();
            history.sort_by_key(|s| s.created_at);
            history
        }))
    }

    async fn institution_scores(
        &self,
        institution_id: InstitutionId,
        instrument: Instrument,
    ) -> Result<Vec<ScoreRecord>, RepositoryError> {
        Ok(self.with(|t| {
            let members: HashSet<UserId> = t
                .users
                .iter()
                .filter(|(u, _)| u.institution_id == Some(institution_id))
                .map(|(u, _)| u.id)
                .collect();
            t.scores
                .iter()
                .filter(|s| s.instrument == instrument && members.contains(&s.user_id))
                .map(ScoreRecord::from)
                .collect()
        }))
    }
}

impl ChatHistoryStore for MemoryStore {
    async fn load_history(&self, user_id: UserId) -> Result<Vec<ChatMessage>, RepositoryError> {
        Ok(self.transcript(user_id).unwrap_or_default())
    }

    async fn save_history(
        &self,
        user_id: UserId,
        messages: &[ChatMessage],
    ) -> Result<(), RepositoryError> {
        self.with(|t| {
            t.transcripts.retain(|(owner, _)| *owner != user_id);
            t.transcripts.push((user_id, messages.to_vec()));
        });
        Ok(())
    }

    async fn clear_history(&self, user_id: UserId) -> Result<(), RepositoryError> {
        self.with(|t| t.transcripts.retain(|(owner, _)| *owner != user_id));
        Ok(())
    }
}

impl ForumStore for MemoryStore {
    async fn create_post(&self, post: &NewForumPost) -> Result<ForumPost, RepositoryError> {
        self.with(|t| {
            let created = ForumPost {
                id: ForumPostId::new(t.next_id()),
                author_alias: post.author_alias.clone(),
                title: post.title.clone(),
                body: post.body.clone(),
                upvotes: 0,
                reply_count: 0,
                last_reply_by: None,
                created_at: Utc::now(),
            };
            t.posts.push((post.author_id, created.clone()));
            Ok(created)
        })
    }

    async fn list_posts(
        &self,
        sort: ForumSort,
        limit: i64,
    ) -> Result<Vec<ForumPost>, RepositoryError> {
        Ok(self.with(|t| {
            // Newest first; the stable sort keeps that order among equal votes.
            let mut posts: Vec<ForumPost> = t
                .posts
                .iter()
                .rev()
                .filter_map(|(_, p)| t.post_view(p.id))
                .collect();
            if sort == ForumSort::Top {
                posts.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
            }
            posts.truncate(usize::try_from(limit).unwrap_or(0));
            posts
        }))
    }

    async fn find_post(&self, id: ForumPostId) -> Result<Option<ForumPost>, RepositoryError> {
        Ok(self.with(|t| t.post_view(id)))
    }

    async fn list_replies(&self, post_id: ForumPostId) -> Result<Vec<ForumReply>, RepositoryError> {
        Ok(self.with(|t| {
            t.replies
                .iter()
                .filter(|r| r.post_id == post_id)
                .cloned()
                .collect()
        }))
    }

    async fn add_reply(&self, reply: &NewForumReply) -> Result<ForumReply, RepositoryError> {
        self.with(|t| {
            if !t.posts.iter().any(|(_, p)| p.id == reply.post_id) {
                return Err(RepositoryError::NotFound);
            }
            let created = ForumReply {
                id: ForumReplyId::new(t.next_id()),
                post_id: reply.post_id,
                author_alias: reply.author_alias.clone(),
                body: reply.body.clone(),
                created_at: Utc::now(),
            };
            t.replies.push(created.clone());
            Ok(created)
        })
    }

    async fn upvote(
        &self,
        post_id: ForumPostId,
        user_id: UserId,
    ) -> Result<ForumPost, RepositoryError> {
        self.with(|t| {
            if !t.posts.iter().any(|(_, p)| p.id == post_id) {
                return Err(RepositoryError::NotFound);
            }
            t.upvotes.insert((post_id, user_id));
            t.post_view(post_id).ok_or(RepositoryError::NotFound)
        })
    }
}

// =============================================================================
// Scripted generator
// =============================================================================

/// A [`TextGenerator`] that replays queued results.
///
/// An empty queue answers with `GenerationError::EmptyResponse`.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn replying(text: &str) -> Self {
        Self::new().then(Ok(text.to_string()))
    }

    #[must_use]
    pub fn failing(error: GenerationError) -> Self {
        Self::new().then(Err(error))
    }

    /// Queue another result.
    #[must_use]
    pub fn then(self, result: Result<String, GenerationError>) -> Self {
        self.script.lock().expect("script lock").push_back(result);
        self
    }

    /// Sleep before answering, to exercise timeouts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompt received.
    #[must_use]
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().expect("prompt lock").last().cloned()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompt lock")
            .push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().expect("script lock").pop_front();
        next.unwrap_or(Err(GenerationError::EmptyResponse))
    }
}
