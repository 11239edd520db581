//! PHQ-9 / GAD-7 submission and history.
//!
//! The server is the only place a score is computed: whatever total the
//! client shows must agree with the answers it sends.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use calmly_core::assessment::{ANSWER_OPTIONS, AnswerOption};
use calmly_core::{Instrument, RequestContext, Responses, Severity};

use crate::db::ScoreStore;
use crate::error::AppError;
use crate::models::{NewScore, StoredScore};

/// Scores shown on the student dashboard, per instrument.
pub const RECENT_SCORE_LIMIT: i64 = 5;

/// Body of `POST /api/assessments`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreSubmission {
    #[serde(rename = "type")]
    pub instrument: Instrument,
    /// Total as computed by the client; optional, checked when present.
    pub score: Option<i32>,
    /// Ignored; the band is always recomputed.
    pub severity: Option<String>,
    pub responses: Option<Responses>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub score: StoredScore,
    pub severity: Severity,
    pub risk: &'static str,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: u8,
    pub text: &'static str,
}

/// Everything a client needs to render a questionnaire.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSet {
    pub instrument: Instrument,
    pub title: &'static str,
    pub questions: Vec<Question>,
    pub options: &'static [AnswerOption],
}

#[must_use]
pub fn question_set(instrument: Instrument) -> QuestionSet {
    QuestionSet {
        instrument,
        title: instrument.title(),
        questions: (1..=instrument.item_count())
            .zip(instrument.questions())
            .map(|(id, text)| Question { id, text })
            .collect(),
        options: &ANSWER_OPTIONS,
    }
}

pub struct AssessmentService<'a, S> {
    scores: &'a S,
}

impl<'a, S: ScoreStore> AssessmentService<'a, S> {
    #[must_use]
    pub const fn new(scores: &'a S) -> Self {
        Self { scores }
    }

    /// Score and store one questionnaire.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-students, `Validation` for missing, incomplete
    /// or inconsistent answers.
    #[instrument(skip(self, ctx, submission), fields(user_id = %ctx.user_id, instrument = %submission.instrument.as_str()))]
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        submission: ScoreSubmission,
    ) -> Result<SubmissionResult, AppError> {
        ctx.require_student()?;

        let responses = submission
            .responses
            .ok_or_else(|| AppError::validation("Missing responses"))?;

        let assessment = submission.instrument.score(&responses)?;

        match submission.score {
            Some(claimed) if claimed != i32::from(assessment.score) => {
                return Err(AppError::validation(format!(
                    "Submitted score {claimed} does not match the answers (expected {})",
                    assessment.score
                )));
            }
            _ => {}
        }

        let stored = self
            .scores
            .insert_score(&NewScore {
                user_id: ctx.user_id,
                instrument: assessment.instrument,
                score: i32::from(assessment.score),
                severity: assessment.severity.label().to_string(),
                responses,
            })
            .await?;

        info!(
            score = assessment.score,
            severity = %assessment.severity,
            "Screening recorded"
        );

        Ok(SubmissionResult {
            score: stored,
            severity: assessment.severity,
            risk: assessment.severity.risk(),
            interpretation: assessment.interpretation(),
        })
    }

    /// The caller's latest scores for one instrument, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the store fails.
    pub async fn recent(
        &self,
        ctx: &RequestContext,
        instrument: Instrument,
    ) -> Result<Vec<StoredScore>, AppError> {
        Ok(self
            .scores
            .recent_scores(ctx.user_id, instrument, RECENT_SCORE_LIMIT)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_set_numbering() {
        let set = question_set(Instrument::Gad7);
        assert_eq!(set.questions.len(), 7);
        assert_eq!(set.questions[0].id, 1);
        assert_eq!(set.questions[6].id, 7);
        assert_eq!(set.options.len(), 4);
    }

    #[test]
    fn test_submission_wire_format() {
        let submission: ScoreSubmission = serde_json::from_str(
            r#"{"type":"phq9","score":3,"severity":"Minimal","responses":{"1":1,"2":2}}"#,
        )
        .unwrap();

        assert_eq!(submission.instrument, Instrument::Phq9);
        assert_eq!(submission.score, Some(3));
        assert_eq!(submission.responses.unwrap().get(&2), Some(&2));
    }
}
