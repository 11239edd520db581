//! Institution-wide screening analytics.

use tracing::{info, instrument};

use calmly_core::analytics::{self, InstitutionAnalytics};
use calmly_core::{Instrument, RequestContext};

use crate::db::ScoreStore;
use crate::error::AppError;

pub struct AnalyticsService<'a, S> {
    scores: &'a S,
}

impl<'a, S: ScoreStore> AnalyticsService<'a, S> {
    #[must_use]
    pub const fn new(scores: &'a S) -> Self {
        Self { scores }
    }

    /// Aggregate every score of the caller's institution.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is an admin linked to an institution.
    #[instrument(skip_all, fields(user_id = %ctx.user_id))]
    pub async fn for_caller(&self, ctx: &RequestContext) -> Result<InstitutionAnalytics, AppError> {
        let institution = ctx.require_admin()?;

        let phq9 = self
            .scores
            .institution_scores(institution, Instrument::Phq9)
            .await?;
        let gad7 = self
            .scores
            .institution_scores(institution, Instrument::Gad7)
            .await?;

        let summary = analytics::summarize(&phq9, &gad7);
        info!(
            institution_id = %institution,
            total_screenings = summary.total_screenings,
            "Analytics computed"
        );
        Ok(summary)
    }
}
