//! Institution-level screening analytics.
//!
//! Pure aggregation over already-scoped score records: per-instrument
//! counts, mean scores, severity distribution, and a month-by-month trend
//! that merges both instruments.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::assessment::{Instrument, Severity};

/// A stored score as the aggregator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub score: i32,
    /// Severity label as persisted, e.g. `"Moderate"` or `"Mild Anxiety"`.
    pub severity: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandCount {
    pub severity: Severity,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSummary {
    pub count: u32,
    /// Mean score, `0.0` when there are no records.
    pub average_score: f64,
    /// One entry per band of the instrument, mildest first.
    pub distribution: Vec<BandCount>,
}

/// One calendar month of the merged trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub phq9_avg: Option<f64>,
    pub gad7_avg: Option<f64>,
    pub screenings: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionAnalytics {
    pub total_screenings: u32,
    pub phq9: InstrumentSummary,
    pub gad7: InstrumentSummary,
    pub monthly_trends: Vec<MonthlyTrend>,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, score: i32) {
        self.sum += f64::from(score);
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

/// Aggregate one institution's PHQ-9 and GAD-7 records.
#[must_use]
pub fn summarize(phq9: &[ScoreRecord], gad7: &[ScoreRecord]) -> InstitutionAnalytics {
    let phq9_summary = summarize_instrument(Instrument::Phq9, phq9);
    let gad7_summary = summarize_instrument(Instrument::Gad7, gad7);

    InstitutionAnalytics {
        total_screenings: phq9_summary.count + gad7_summary.count,
        phq9: phq9_summary,
        gad7: gad7_summary,
        monthly_trends: monthly_trends(phq9, gad7),
    }
}

fn summarize_instrument(instrument: Instrument, records: &[ScoreRecord]) -> InstrumentSummary {
    let mut mean = Mean::default();
    let mut distribution: Vec<BandCount> = instrument
        .bands()
        .iter()
        .map(|&severity| BandCount { severity, count: 0 })
        .collect();

    for record in records {
        mean.add(record.score);
        let band = band_of(instrument, record);
        if let Some(slot) = distribution.iter_mut().find(|b| b.severity == band) {
            slot.count += 1;
        }
    }

    InstrumentSummary {
        count: mean.count,
        average_score: mean.value().unwrap_or(0.0),
        distribution,
    }
}

/// Band for a record: the stored label when it parses, otherwise derived
/// from the score. A band the instrument lacks folds into `Severe`.
fn band_of(instrument: Instrument, record: &ScoreRecord) -> Severity {
    let band = Severity::from_label(&record.severity).unwrap_or_else(|| {
        let score = u8::try_from(record.score.max(0)).unwrap_or(u8::MAX);
        instrument.severity_for(score)
    });

    if instrument.bands().contains(&band) {
        band
    } else {
        Severity::Severe
    }
}

fn monthly_trends(phq9: &[ScoreRecord], gad7: &[ScoreRecord]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<String, (Mean, Mean)> = BTreeMap::new();

    for record in phq9 {
        months.entry(month_key(record)).or_default().0.add(record.score);
    }
    for record in gad7 {
        months.entry(month_key(record)).or_default().1.add(record.score);
    }

    months
        .into_iter()
        .map(|(month, (phq9, gad7))| MonthlyTrend {
            month,
            phq9_avg: phq9.value(),
            gad7_avg: gad7.value(),
            screenings: phq9.count + gad7.count,
        })
        .collect()
}

fn month_key(record: &ScoreRecord) -> String {
    record.recorded_at.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(score: i32, severity: &str, year: i32, month: u32, day: u32) -> ScoreRecord {
        ScoreRecord {
            score,
            severity: severity.to_string(),
            recorded_at: Utc.with_ymd_and_hms(year, month, day, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_months_with_one_instrument_get_null_for_the_other() {
        let phq9 = [
            record(10, "Moderate", 2024, 1, 3),
            record(12, "Moderate", 2024, 1, 20),
        ];
        let gad7 = [record(5, "Mild", 2024, 2, 11)];

        let analytics = summarize(&phq9, &gad7);

        assert_eq!(
            analytics.monthly_trends,
            vec![
                MonthlyTrend {
                    month: "2024-01".to_string(),
                    phq9_avg: Some(11.0),
                    gad7_avg: None,
                    screenings: 2,
                },
                MonthlyTrend {
                    month: "2024-02".to_string(),
                    phq9_avg: None,
                    gad7_avg: Some(5.0),
                    screenings: 1,
                },
            ]
        );

        let json = serde_json::to_value(&analytics.monthly_trends).unwrap();
        assert_eq!(json[0]["phq9Avg"], 11.0);
        assert!(json[0]["gad7Avg"].is_null());
        assert_eq!(json[1]["month"], "2024-02");
    }

    #[test]
    fn test_months_sorted_across_years() {
        let phq9 = [
            record(3, "Minimal", 2025, 1, 1),
            record(7, "Mild", 2024, 12, 31),
        ];
        let months: Vec<_> = summarize(&phq9, &[])
            .monthly_trends
            .into_iter()
            .map(|t| t.month)
            .collect();
        assert_eq!(months, ["2024-12", "2025-01"]);
    }

    #[test]
    fn test_distribution_and_averages() {
        let phq9 = [
            record(2, "Minimal Depression", 2024, 3, 1),
            record(16, "Moderately Severe Depression", 2024, 3, 2),
            record(12, "Moderate Depression", 2024, 3, 3),
            record(22, "Severe", 2024, 3, 4),
        ];
        let gad7 = [record(17, "Severe Anxiety", 2024, 3, 5)];

        let analytics = summarize(&phq9, &gad7);

        assert_eq!(analytics.total_screenings, 5);
        assert_eq!(analytics.phq9.count, 4);
        assert!((analytics.phq9.average_score - 13.0).abs() < f64::EPSILON);

        let phq9_counts: Vec<_> = analytics
            .phq9
            .distribution
            .iter()
            .map(|b| (b.severity, b.count))
            .collect();
        assert_eq!(
            phq9_counts,
            [
                (Severity::Minimal, 1),
                (Severity::Mild, 0),
                (Severity::Moderate, 1),
                (Severity::ModeratelySevere, 1),
                (Severity::Severe, 1),
            ]
        );

        assert_eq!(analytics.gad7.distribution.len(), 4);
        assert_eq!(analytics.gad7.distribution[3].count, 1);
    }

    #[test]
    fn test_unparseable_label_falls_back_to_score() {
        let gad7 = [record(11, "", 2024, 5, 1), record(16, "Moderately Severe", 2024, 5, 2)];
        let summary = summarize(&[], &gad7).gad7;
        assert_eq!(summary.distribution[2].count, 1);
        assert_eq!(summary.distribution[3].count, 1);
    }

    #[test]
    fn test_empty_input() {
        let analytics = summarize(&[], &[]);
        assert_eq!(analytics.total_screenings, 0);
        assert!(analytics.phq9.average_score.abs() < f64::EPSILON);
        assert!(analytics.monthly_trends.is_empty());
    }
}
