//! PHQ-9 and GAD-7 scoring.
//!
//! Both questionnaires share the same four-point answer scale. A submission
//! is a map of question id (1-based) to answer value; the score is the sum
//! of the values and the severity band follows the published cut-offs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Answers keyed by 1-based question id.
pub type Responses = BTreeMap<u8, u8>;

/// Highest value on the shared answer scale.
pub const MAX_ANSWER: u8 = 3;

/// One point on the "over the last two weeks" frequency scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    pub value: u8,
    pub label: &'static str,
}

pub const ANSWER_OPTIONS: [AnswerOption; 4] = [
    AnswerOption {
        value: 0,
        label: "Not at all",
    },
    AnswerOption {
        value: 1,
        label: "Several days",
    },
    AnswerOption {
        value: 2,
        label: "More than half the days",
    },
    AnswerOption {
        value: 3,
        label: "Nearly every day",
    },
];

const PHQ9_QUESTIONS: [&str; 9] = [
    "Little interest or pleasure in doing things",
    "Feeling down, depressed, or hopeless",
    "Trouble falling or staying asleep, or sleeping too much",
    "Feeling tired or having little energy",
    "Poor appetite or overeating",
    "Feeling bad about yourself, or that you are a failure or have let yourself or your family down",
    "Trouble concentrating on things, such as reading the newspaper or watching television",
    "Moving or speaking so slowly that other people could have noticed, or the opposite: being so fidgety or restless that you have been moving around a lot more than usual",
    "Thoughts that you would be better off dead or of hurting yourself in some way",
];

const GAD7_QUESTIONS: [&str; 7] = [
    "Feeling nervous, anxious, or on edge",
    "Not being able to stop or control worrying",
    "Worrying too much about different things",
    "Trouble relaxing",
    "Being so restless that it's hard to sit still",
    "Becoming easily annoyed or irritable",
    "Feeling afraid as if something awful might happen",
];

const PHQ9_BANDS: [Severity; 5] = [
    Severity::Minimal,
    Severity::Mild,
    Severity::Moderate,
    Severity::ModeratelySevere,
    Severity::Severe,
];

const GAD7_BANDS: [Severity; 4] = [
    Severity::Minimal,
    Severity::Mild,
    Severity::Moderate,
    Severity::Severe,
];

/// A supported screening questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "screening_instrument", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// Patient Health Questionnaire (depression), 9 items.
    Phq9,
    /// Generalized Anxiety Disorder scale, 7 items.
    Gad7,
}

impl Instrument {
    pub const ALL: [Self; 2] = [Self::Phq9, Self::Gad7];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phq9 => "phq9",
            Self::Gad7 => "gad7",
        }
    }

    /// Display name, e.g. `PHQ-9`.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Phq9 => "PHQ-9",
            Self::Gad7 => "GAD-7",
        }
    }

    /// The condition the instrument screens for, used in result labels.
    #[must_use]
    pub const fn condition(self) -> &'static str {
        match self {
            Self::Phq9 => "Depression",
            Self::Gad7 => "Anxiety",
        }
    }

    #[must_use]
    pub const fn questions(self) -> &'static [&'static str] {
        match self {
            Self::Phq9 => &PHQ9_QUESTIONS,
            Self::Gad7 => &GAD7_QUESTIONS,
        }
    }

    #[must_use]
    pub const fn item_count(self) -> u8 {
        match self {
            Self::Phq9 => 9,
            Self::Gad7 => 7,
        }
    }

    #[must_use]
    pub const fn max_score(self) -> u8 {
        self.item_count() * MAX_ANSWER
    }

    /// Severity bands this instrument can produce, mildest first.
    #[must_use]
    pub const fn bands(self) -> &'static [Severity] {
        match self {
            Self::Phq9 => &PHQ9_BANDS,
            Self::Gad7 => &GAD7_BANDS,
        }
    }

    /// Map a total score to its severity band.
    ///
    /// GAD-7 has no "moderately severe" band: 15 and above is severe.
    #[must_use]
    pub const fn severity_for(self, score: u8) -> Severity {
        match (self, score) {
            (_, 0..=4) => Severity::Minimal,
            (_, 5..=9) => Severity::Mild,
            (_, 10..=14) => Severity::Moderate,
            (Self::Phq9, 15..=19) => Severity::ModeratelySevere,
            _ => Severity::Severe,
        }
    }

    /// Validate a complete answer set and score it.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError`] when a question id is outside `1..=N`, an
    /// answer is outside `0..=3`, or any question is unanswered.
    pub fn score(self, responses: &Responses) -> Result<Assessment, ScoringError> {
        let count = self.item_count();

        if let Some(&question) = responses.keys().find(|&&id| id == 0 || id > count) {
            return Err(ScoringError::UnknownQuestion {
                instrument: self,
                question,
            });
        }

        if let Some((&question, &value)) = responses.iter().find(|&(_, &v)| v > MAX_ANSWER) {
            return Err(ScoringError::AnswerOutOfRange { question, value });
        }

        let missing: Vec<u8> = (1..=count)
            .filter(|id| !responses.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(ScoringError::Incomplete {
                instrument: self,
                missing,
            });
        }

        let score = responses.values().sum();
        Ok(Assessment {
            instrument: self,
            score,
            severity: self.severity_for(score),
        })
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phq9" => Ok(Self::Phq9),
            "gad7" => Ok(Self::Gad7),
            _ => Err(format!("invalid test type: {s}")),
        }
    }
}

/// Severity band shared by both instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Minimal,
    Mild,
    Moderate,
    #[serde(rename = "Moderately Severe")]
    ModeratelySevere,
    Severe,
}

impl Severity {
    /// Band name as stored alongside a score.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minimal => "Minimal",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::ModeratelySevere => "Moderately Severe",
            Self::Severe => "Severe",
        }
    }

    /// Risk wording shown next to a result.
    #[must_use]
    pub const fn risk(self) -> &'static str {
        match self {
            Self::Minimal => "Minimal",
            Self::Mild => "Low",
            Self::Moderate => "Moderate",
            Self::ModeratelySevere => "Moderate to High",
            Self::Severe => "High",
        }
    }

    /// Recover a band from a stored label such as `"Moderate Depression"`.
    ///
    /// "Moderately Severe" is checked before "Moderate" since the former
    /// contains the latter.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_ascii_lowercase();
        [
            Self::Minimal,
            Self::Mild,
            Self::ModeratelySevere,
            Self::Moderate,
            Self::Severe,
        ]
        .into_iter()
        .find(|band| label.contains(&band.label().to_ascii_lowercase()))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scored questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub instrument: Instrument,
    pub score: u8,
    pub severity: Severity,
}

impl Assessment {
    /// Full interpretation, e.g. `"Moderately Severe Depression"`.
    #[must_use]
    pub fn interpretation(&self) -> String {
        format!("{} {}", self.severity, self.instrument.condition())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("{} has no question {question}", .instrument.title())]
    UnknownQuestion { instrument: Instrument, question: u8 },

    #[error("answer {value} to question {question} is outside 0-3")]
    AnswerOutOfRange { question: u8, value: u8 },

    #[error("{} is missing answers for questions {missing:?}", .instrument.title())]
    Incomplete {
        instrument: Instrument,
        missing: Vec<u8>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spread `total` across the instrument's questions, filling each up to 3.
    fn responses_summing_to(instrument: Instrument, total: u8) -> Responses {
        let mut left = total;
        (1..=instrument.item_count())
            .map(|id| {
                let value = left.min(MAX_ANSWER);
                left -= value;
                (id, value)
            })
            .collect()
    }

    #[test]
    fn test_phq9_boundaries() {
        let cases = [
            (0, Severity::Minimal),
            (4, Severity::Minimal),
            (5, Severity::Mild),
            (9, Severity::Mild),
            (10, Severity::Moderate),
            (14, Severity::Moderate),
            (15, Severity::ModeratelySevere),
            (19, Severity::ModeratelySevere),
            (20, Severity::Severe),
            (27, Severity::Severe),
        ];
        for (total, expected) in cases {
            let result = Instrument::Phq9
                .score(&responses_summing_to(Instrument::Phq9, total))
                .unwrap();
            assert_eq!(result.score, total);
            assert_eq!(result.severity, expected, "score {total}");
        }
    }

    #[test]
    fn test_gad7_boundaries() {
        let cases = [
            (4, Severity::Minimal),
            (5, Severity::Mild),
            (9, Severity::Mild),
            (10, Severity::Moderate),
            (14, Severity::Moderate),
            (15, Severity::Severe),
            (21, Severity::Severe),
        ];
        for (total, expected) in cases {
            let result = Instrument::Gad7
                .score(&responses_summing_to(Instrument::Gad7, total))
                .unwrap();
            assert_eq!(result.severity, expected, "score {total}");
        }
    }

    #[test]
    fn test_max_scores() {
        assert_eq!(Instrument::Phq9.max_score(), 27);
        assert_eq!(Instrument::Gad7.max_score(), 21);
    }

    #[test]
    fn test_incomplete_answers_rejected() {
        let mut responses = responses_summing_to(Instrument::Phq9, 6);
        responses.remove(&4);
        responses.remove(&9);

        let err = Instrument::Phq9.score(&responses).unwrap_err();
        assert_eq!(
            err,
            ScoringError::Incomplete {
                instrument: Instrument::Phq9,
                missing: vec![4, 9],
            }
        );
    }

    #[test]
    fn test_unknown_question_rejected() {
        let mut responses = responses_summing_to(Instrument::Gad7, 3);
        responses.insert(8, 1);
        assert!(matches!(
            Instrument::Gad7.score(&responses),
            Err(ScoringError::UnknownQuestion { question: 8, .. })
        ));
    }

    #[test]
    fn test_answer_out_of_range_rejected() {
        let mut responses = responses_summing_to(Instrument::Gad7, 0);
        responses.insert(2, 4);
        assert_eq!(
            Instrument::Gad7.score(&responses),
            Err(ScoringError::AnswerOutOfRange {
                question: 2,
                value: 4
            })
        );
    }

    #[test]
    fn test_severity_from_label_prefers_moderately_severe() {
        assert_eq!(
            Severity::from_label("Moderately Severe Depression"),
            Some(Severity::ModeratelySevere)
        );
        assert_eq!(
            Severity::from_label("Moderate Anxiety"),
            Some(Severity::Moderate)
        );
        assert_eq!(Severity::from_label("minimal"), Some(Severity::Minimal));
        assert_eq!(Severity::from_label("unknown"), None);
    }

    #[test]
    fn test_interpretation_and_risk() {
        let result = Instrument::Phq9
            .score(&responses_summing_to(Instrument::Phq9, 16))
            .unwrap();
        assert_eq!(result.interpretation(), "Moderately Severe Depression");
        assert_eq!(result.severity.risk(), "Moderate to High");
    }

    #[test]
    fn test_responses_deserialize_from_string_keys() {
        let responses: Responses =
            serde_json::from_str(r#"{"1":0,"2":1,"3":2,"4":3,"5":0,"6":1,"7":2}"#).unwrap();
        let result = Instrument::Gad7.score(&responses).unwrap();
        assert_eq!(result.score, 9);
        assert_eq!(result.severity, Severity::Mild);
    }
}
