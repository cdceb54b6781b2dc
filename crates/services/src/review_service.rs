use std::sync::Arc;

use chrono::{DateTime, Utc};

use srs_core::Clock;
use srs_core::model::{QuestionId, Rating, ReviewState, UserId};
use srs_core::scheduler::next_review;
use storage::repository::{ActivityRepository, QuestionRepository};

use crate::error::ReviewServiceError;

/// Outcome of a persisted review.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedReview {
    pub question_id: QuestionId,
    pub rating: Rating,
    pub state: ReviewState,
}

/// Applies ratings to questions and records the study activity behind
/// streaks.
pub struct ReviewService {
    questions: Arc<dyn QuestionRepository>,
    activity: Arc<dyn ActivityRepository>,
    clock: Clock,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        activity: Arc<dyn ActivityRepository>,
    ) -> Self {
        Self::with_clock(questions, activity, Clock::Default)
    }

    #[must_use]
    pub fn with_clock(
        questions: Arc<dyn QuestionRepository>,
        activity: Arc<dyn ActivityRepository>,
        clock: Clock,
    ) -> Self {
        Self {
            questions,
            activity,
            clock,
        }
    }

    /// Rates a question and persists the resulting schedule.
    ///
    /// The stored state always records `last_reviewed = now`, including when
    /// a repeat rating on the same calendar day leaves the schedule
    /// untouched. Activity logging is best-effort: a failed log is reported
    /// via tracing but never fails the review.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::NotFound` when the question does not
    /// exist or belongs to another user, `ReviewServiceError::Storage` on
    /// query failure.
    pub async fn submit_review(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        rating: Rating,
    ) -> Result<SubmittedReview, ReviewServiceError> {
        let now = self.clock.now();

        let current = self
            .questions
            .find_review_state(user_id, question_id)
            .await?
            .ok_or(ReviewServiceError::NotFound)?;

        let update = next_review(rating, &current, now);
        let state = ReviewState::after_review(&update, now);

        let stored: Option<DateTime<Utc>> = self
            .questions
            .update_review_state(user_id, question_id, &state)
            .await?;
        if stored.is_none() {
            return Err(ReviewServiceError::NotFound);
        }

        if let Err(err) = self.activity.record_activity(user_id, now).await {
            tracing::warn!(user = %user_id, %err, "failed to record study activity");
        }

        Ok(SubmittedReview {
            question_id,
            rating,
            state,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
