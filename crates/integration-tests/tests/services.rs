//! Service-level tests: scoring, analytics, authorization and the forum.
//!
//! Every service runs against [`MemoryStore`], so the authorization checks
//! can be asserted together with their (absent) side effects.
//!
//! Run with: cargo test -p calmly-integration-tests --test services

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::{Duration, TimeZone, Utc};

use calmly_core::{
    AccessError, BookingStatus, Instrument, Responses, Severity, TherapistId, UserRole,
};
use calmly_integration_tests::{MemoryStore, email};
use calmly_server::db::UserStore;
use calmly_server::error::AppError;
use calmly_server::models::{ForumSort, NewTherapist};
use calmly_server::random::FixedRandom;
use calmly_server::services::assessments::ScoreSubmission;
use calmly_server::services::auth::AuthError;
use calmly_server::services::bookings::BookingRequest;
use calmly_server::services::forum::{PostForm, ReplyForm};
use calmly_server::services::onboarding::{RoleSelection, StudentOnboarding, UserUpdate};
use calmly_server::services::{
    AnalyticsService, AssessmentService, AuthService, BookingService, DashboardService,
    ForumService, InstitutionService, OnboardingService, TherapistService,
};

fn answers(values: &[u8]) -> Responses {
    (1..).zip(values.iter().copied()).collect()
}

fn submission(instrument: Instrument, values: &[u8], score: Option<i32>) -> ScoreSubmission {
    ScoreSubmission {
        instrument,
        score,
        severity: None,
        responses: Some(answers(values)),
    }
}

fn new_therapist(name: &str, address: &str) -> NewTherapist {
    NewTherapist {
        name: name.to_string(),
        email: email(address),
        specialties: vec![" Anxiety ".to_string(), String::new()],
        phone: None,
    }
}

// ============================================================================
// Assessments
// ============================================================================

#[tokio::test]
async fn test_submit_scores_and_stores_band() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), Some(institution.id));
    let service = AssessmentService::new(&store);

    let result = service
        .submit(
            &student.context(),
            submission(Instrument::Phq9, &[2, 2, 2, 2, 2, 1, 1, 1, 1], Some(14)),
        )
        .await
        .unwrap();

    assert_eq!(result.score.score, 14);
    assert_eq!(result.score.severity, "Moderate");
    assert_eq!(result.severity, Severity::Moderate);
    assert_eq!(result.interpretation, "Moderate Depression");

    let recent = service
        .recent(&student.context(), Instrument::Phq9)
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn test_submit_rejects_mismatched_total() {
    let store = MemoryStore::new();
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), None);

    let err = AssessmentService::new(&store)
        .submit(
            &student.context(),
            submission(Instrument::Gad7, &[3, 3, 3, 3, 3, 3, 3], Some(2)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.score_count(), 0);
}

#[tokio::test]
async fn test_submit_rejects_incomplete_answers() {
    let store = MemoryStore::new();
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), None);

    let err = AssessmentService::new(&store)
        .submit(
            &student.context(),
            submission(Instrument::Phq9, &[1, 1, 1], None),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.score_count(), 0);
}

#[tokio::test]
async fn test_submit_requires_student_role() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let admin = store.seed_user(
        "hod@example.edu",
        Some(UserRole::InstitutionAdmin),
        Some(institution.id),
    );

    let err = AssessmentService::new(&store)
        .submit(
            &admin.context(),
            submission(Instrument::Gad7, &[0, 0, 0, 0, 0, 0, 0], None),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(store.score_count(), 0);
}

// ============================================================================
// Analytics
// ============================================================================

#[tokio::test]
async fn test_analytics_monthly_trend_merges_instruments() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let admin = store.seed_user(
        "hod@example.edu",
        Some(UserRole::InstitutionAdmin),
        Some(institution.id),
    );
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), Some(institution.id));

    let jan = |day| Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
    store.seed_score(student.id, Instrument::Phq9, 10, "Moderate", jan(3));
    store.seed_score(student.id, Instrument::Phq9, 12, "Moderate", jan(20));
    store.seed_score(
        student.id,
        Instrument::Gad7,
        5,
        "Mild",
        Utc.with_ymd_and_hms(2024, 2, 11, 9, 0, 0).unwrap(),
    );

    let analytics = AnalyticsService::new(&store)
        .for_caller(&admin.context())
        .await
        .unwrap();

    assert_eq!(analytics.total_screenings, 3);
    assert_eq!(analytics.monthly_trends.len(), 2);
    assert_eq!(analytics.monthly_trends[0].month, "2024-01");
    assert_eq!(analytics.monthly_trends[0].phq9_avg, Some(11.0));
    assert_eq!(analytics.monthly_trends[0].gad7_avg, None);
    assert_eq!(analytics.monthly_trends[1].month, "2024-02");
    assert_eq!(analytics.monthly_trends[1].phq9_avg, None);
    assert_eq!(analytics.monthly_trends[1].gad7_avg, Some(5.0));
}

#[tokio::test]
async fn test_analytics_excludes_other_institutions() {
    let store = MemoryStore::new();
    let ours = store.seed_institution("Pune Institute of Technology");
    let theirs = store.seed_institution("Nagpur College");
    let admin = store.seed_user("hod@example.edu", Some(UserRole::InstitutionAdmin), Some(ours.id));
    let outsider = store.seed_user("ravi@example.edu", Some(UserRole::Student), Some(theirs.id));
    store.seed_score(outsider.id, Instrument::Phq9, 20, "Severe", Utc::now());

    let analytics = AnalyticsService::new(&store)
        .for_caller(&admin.context())
        .await
        .unwrap();

    assert_eq!(analytics.total_screenings, 0);
    assert!(analytics.phq9.average_score.abs() < f64::EPSILON);
    assert!(analytics.monthly_trends.is_empty());
}

#[tokio::test]
async fn test_analytics_denied_to_students() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), Some(institution.id));

    let err = AnalyticsService::new(&store)
        .for_caller(&student.context())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Forbidden(AccessError::WrongRole(UserRole::InstitutionAdmin))
    ));
}

// ============================================================================
// Authorization Gate
// ============================================================================

#[tokio::test]
async fn test_admin_cannot_add_therapist_to_other_institution() {
    let store = MemoryStore::new();
    let ours = store.seed_institution("Pune Institute of Technology");
    let theirs = store.seed_institution("Nagpur College");
    let admin = store.seed_user("hod@example.edu", Some(UserRole::InstitutionAdmin), Some(ours.id));

    let err = TherapistService::new(&store)
        .add(
            &admin.context(),
            theirs.id,
            new_therapist("Dr. Mehta", "mehta@example.edu"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Forbidden(AccessError::OtherInstitution)
    ));
    assert_eq!(store.therapist_count(), 0);
}

#[tokio::test]
async fn test_admin_manages_own_therapists() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let admin = store.seed_user(
        "hod@example.edu",
        Some(UserRole::InstitutionAdmin),
        Some(institution.id),
    );
    let service = TherapistService::new(&store);

    let therapist = service
        .add(
            &admin.context(),
            institution.id,
            new_therapist("  Dr. Mehta ", "mehta@example.edu"),
        )
        .await
        .unwrap();
    assert_eq!(therapist.name, "Dr. Mehta");
    assert_eq!(therapist.specialties, vec!["Anxiety".to_string()]);

    service
        .remove(&admin.context(), institution.id, therapist.id)
        .await
        .unwrap();
    let err = service
        .remove(&admin.context(), institution.id, therapist.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_student_cannot_book_therapist_of_other_institution() {
    let store = MemoryStore::new();
    let ours = store.seed_institution("Pune Institute of Technology");
    let theirs = store.seed_institution("Nagpur College");
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), Some(ours.id));
    let therapist = store.seed_therapist(theirs.id, "Dr. Iyer");
    let now = Utc::now();

    let err = BookingService::new(&store)
        .create(
            &student.context(),
            BookingRequest {
                therapist_id: therapist.id,
                appointment_at: now + Duration::days(2),
            },
            now,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Forbidden(AccessError::OtherInstitution)
    ));
    assert_eq!(store.booking_count(), 0);
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), Some(institution.id));
    let admin = store.seed_user(
        "hod@example.edu",
        Some(UserRole::InstitutionAdmin),
        Some(institution.id),
    );
    let therapist = store.seed_therapist(institution.id, "Dr. Iyer");
    let service = BookingService::new(&store);
    let now = Utc::now();

    let past = service
        .create(
            &student.context(),
            BookingRequest {
                therapist_id: therapist.id,
                appointment_at: now - Duration::hours(1),
            },
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(past, AppError::Validation(_)));

    let unknown = service
        .create(
            &student.context(),
            BookingRequest {
                therapist_id: TherapistId::new(9999),
                appointment_at: now + Duration::days(1),
            },
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(unknown, AppError::NotFound(_)));

    let booking = service
        .create(
            &student.context(),
            BookingRequest {
                therapist_id: therapist.id,
                appointment_at: now + Duration::days(1),
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.therapist_name, "Dr. Iyer");

    let denied = service
        .confirm(&student.context(), institution.id, booking.id)
        .await
        .unwrap_err();
    assert!(matches!(denied, AppError::Forbidden(_)));

    let confirmed = service
        .confirm(&admin.context(), institution.id, booking.id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let again = service
        .confirm(&admin.context(), institution.id, booking.id)
        .await
        .unwrap();
    assert_eq!(again.status, BookingStatus::Confirmed);

    assert_eq!(service.list(&student.context()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_student_details_hidden_from_other_institutions() {
    let store = MemoryStore::new();
    let ours = store.seed_institution("Pune Institute of Technology");
    let theirs = store.seed_institution("Nagpur College");
    let admin = store.seed_user("hod@example.edu", Some(UserRole::InstitutionAdmin), Some(ours.id));
    let outsider = store.seed_user("ravi@example.edu", Some(UserRole::Student), Some(theirs.id));
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), Some(ours.id));
    store.seed_score(student.id, Instrument::Gad7, 8, "Mild", Utc::now());
    let service = InstitutionService::new(&store);

    let err = service
        .student_details(&admin.context(), ours.id, outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = service
        .student_details(&admin.context(), theirs.id, outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let details = service
        .student_details(&admin.context(), ours.id, student.id)
        .await
        .unwrap();
    assert_eq!(details.gad7_history.len(), 1);
    assert!(details.phq9_history.is_empty());
}

// ============================================================================
// Accounts & onboarding
// ============================================================================

#[tokio::test]
async fn test_register_then_sign_in() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);

    let user = auth
        .register("Asha@Example.edu", "Asha", "correct horse battery")
        .await
        .unwrap();
    assert_eq!(user.role, None);

    assert!(
        auth.register("asha@example.edu", "Asha", "another password")
            .await
            .is_err()
    );
    assert!(auth.sign_in("asha@example.edu", "wrong password").await.is_err());

    let signed_in = auth
        .sign_in("asha@example.edu", "correct horse battery")
        .await
        .unwrap();
    assert_eq!(signed_in.id, user.id);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_fail_alike() {
    let store = MemoryStore::new();
    let auth = AuthService::new(&store);
    auth.register("asha@example.edu", "Asha", "correct horse battery")
        .await
        .unwrap();

    let unknown = auth
        .sign_in("nobody@example.edu", "correct horse battery")
        .await
        .unwrap_err();
    let wrong = auth.sign_in("asha@example.edu", "wrong password").await.unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_failed_institution_link_leaves_role_unset() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let user = store.seed_user("asha@example.edu", None, None);
    let service = OnboardingService::new(&store);
    store.reject_institution_links();

    let result = service
        .choose_role(
            &user.context(),
            RoleSelection {
                role: UserRole::Student,
                institution_id: Some(institution.id),
            },
        )
        .await;
    assert!(result.is_err());

    let stored = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.role, None);
    assert_eq!(stored.institution_id, None);
}

#[tokio::test]
async fn test_student_onboarding_links_institution_once() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let other = store.seed_institution("Nagpur College");
    let user = store.seed_user("asha@example.edu", None, None);
    let service = OnboardingService::new(&store);

    let chosen = service
        .choose_role(
            &user.context(),
            RoleSelection {
                role: UserRole::Student,
                institution_id: Some(institution.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(chosen.role, Some(UserRole::Student));

    let onboarded = service
        .complete_student(
            &chosen.context(),
            StudentOnboarding {
                institution_id: Some(institution.id),
                profile: serde_json::from_str(r#"{"emergencyContact":"Meera","previousTherapy":"no"}"#)
                    .unwrap(),
                consent_given: Some(true),
            },
        )
        .await
        .unwrap();
    assert_eq!(onboarded.institution_id, Some(institution.id));
    assert_eq!(onboarded.profile.emergency_contact.as_deref(), Some("Meera"));
    assert!(onboarded.consent_given);

    let err = service
        .complete_student(
            &onboarded.context(),
            StudentOnboarding {
                institution_id: Some(other.id),
                profile: Default::default(),
                consent_given: Some(true),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = service
        .choose_role(
            &onboarded.context(),
            RoleSelection {
                role: UserRole::InstitutionAdmin,
                institution_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = service
        .update_user(
            &onboarded.context(),
            UserUpdate {
                name: Some("   ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_student_dashboard_collects_recent_activity() {
    let store = MemoryStore::new();
    let institution = store.seed_institution("Pune Institute of Technology");
    let student = store.seed_user("asha@example.edu", Some(UserRole::Student), Some(institution.id));
    for day in 1..=7 {
        store.seed_score(
            student.id,
            Instrument::Phq9,
            day,
            "Minimal",
            Utc.with_ymd_and_hms(2024, 3, u32::try_from(day).unwrap(), 8, 0, 0)
                .unwrap(),
        );
    }

    let dashboard = DashboardService::new(&store)
        .student(student, Utc::now())
        .await
        .unwrap();

    assert_eq!(dashboard.phq9_scores.len(), 5);
    assert_eq!(dashboard.phq9_scores[0].score, 7);
    assert!(dashboard.gad7_scores.is_empty());
    assert!(!dashboard.has_chat_history);
    assert_eq!(
        dashboard.institution.map(|i| i.name).as_deref(),
        Some("Pune Institute of Technology")
    );
}

// ============================================================================
// Forum
// ============================================================================

#[tokio::test]
async fn test_forum_posts_are_anonymous_and_upvoted_once() {
    let store = MemoryStore::new();
    let author = store.seed_user("asha@example.edu", Some(UserRole::Student), None);
    let reader = store.seed_user("ravi@example.edu", Some(UserRole::Student), None);
    let random = FixedRandom(0);
    let forum = ForumService::new(&store, &random);

    let post = forum
        .create_post(
            &author.context(),
            PostForm {
                title: " Exam anxiety ".into(),
                body: "How do you all cope before finals?".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(post.title, "Exam anxiety");
    assert_eq!(post.author_alias, "QuietOwl100");

    forum
        .reply(
            &reader.context(),
            post.id,
            ReplyForm {
                body: "Short walks help me.".into(),
            },
        )
        .await
        .unwrap();

    forum.upvote(&reader.context(), post.id).await.unwrap();
    let post = forum.upvote(&reader.context(), post.id).await.unwrap();
    assert_eq!(post.upvotes, 1);

    let thread = forum.thread(post.id).await.unwrap();
    assert_eq!(thread.post.reply_count, 1);
    assert_eq!(thread.replies[0].body, "Short walks help me.");

    let listed = forum.list(ForumSort::Top).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_forum_validates_input_and_missing_posts() {
    let store = MemoryStore::new();
    let author = store.seed_user("asha@example.edu", Some(UserRole::Student), None);
    let random = FixedRandom(0);
    let forum = ForumService::new(&store, &random);

    let err = forum
        .create_post(
            &author.context(),
            PostForm {
                title: "  ".into(),
                body: "body".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = forum
        .reply(
            &author.context(),
            calmly_core::ForumPostId::new(404),
            ReplyForm {
                body: "hello?".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m == "Post not found"));
}
