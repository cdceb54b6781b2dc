use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use srs_core::Clock;
use srs_core::model::{Question, QuestionId, UserId};
use srs_core::scoring::rank_by_priority;
use storage::repository::{QuestionFilter, QuestionRepository, SortDir, StorageError};

use crate::error::SelectionError;
use crate::sessions::tiers::{REVIEW_AHEAD_DAYS, SessionMode, Tier};

/// One entry of an assembled study batch.
///
/// `is_review_ahead` marks questions pulled before their scheduled date
/// (review-ahead and future tiers) so the UI can label them.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashCard {
    pub question: Question,
    pub is_review_ahead: bool,
}

//
// ─── SELECTION SERVICE ─────────────────────────────────────────────────────────
//

/// Assembles study batches by walking a mode's tier pipeline.
///
/// Each tier is fetched in order; non-crisis modes only ask each tier for the
/// remainder left by earlier tiers, crisis asks every tier for the full limit.
/// A question never appears twice in one batch.
pub struct SelectionService {
    questions: Arc<dyn QuestionRepository>,
    clock: Clock,
}

impl SelectionService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self::with_clock(questions, Clock::Default)
    }

    #[must_use]
    pub fn with_clock(questions: Arc<dyn QuestionRepository>, clock: Clock) -> Self {
        Self { questions, clock }
    }

    /// Builds a study batch for the given mode.
    ///
    /// The due tier is re-ranked by priority score; later tiers keep their
    /// repository ordering. A crisis batch may contain up to twice `limit`
    /// since its due and new pools are capped independently.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Storage` when any tier fetch fails; partial
    /// batches are never returned.
    pub async fn fetch_questions(
        &self,
        user_id: UserId,
        mode: SessionMode,
        limit: u32,
        filter: &QuestionFilter,
    ) -> Result<Vec<FlashCard>, SelectionError> {
        let now = self.clock.now();
        let mut batch: Vec<FlashCard> = Vec::new();
        let mut seen: HashSet<QuestionId> = HashSet::new();

        for &tier in mode.tiers() {
            let needed = if mode.fills_to_limit() {
                limit.saturating_sub(clamped_len(batch.len()))
            } else {
                limit
            };
            if needed == 0 {
                break;
            }

            let fetched = match self
                .fetch_tier(tier, user_id, needed, now, filter, &seen)
                .await
            {
                Ok(fetched) => fetched,
                Err(err) => {
                    tracing::warn!(user = %user_id, ?tier, %err, "tier fetch failed");
                    return Err(err.into());
                }
            };

            for question in fetched {
                if mode.fills_to_limit() && clamped_len(batch.len()) >= limit {
                    break;
                }
                if seen.insert(question.id()) {
                    batch.push(FlashCard {
                        question,
                        is_review_ahead: tier.is_review_ahead(),
                    });
                }
            }
        }

        tracing::debug!(user = %user_id, ?mode, size = batch.len(), "assembled study batch");
        Ok(batch)
    }

    /// Fetches more due material once a session's batch is exhausted,
    /// skipping everything the session already showed.
    ///
    /// The due pool is over-fetched by the exclusion count so exclusions
    /// cannot starve the page, then topped up from the new pool.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Storage` on query failure.
    pub async fn fetch_overtime_questions(
        &self,
        user_id: UserId,
        limit: u32,
        exclude: &[QuestionId],
        filter: &QuestionFilter,
    ) -> Result<Vec<FlashCard>, SelectionError> {
        let now = self.clock.now();
        let page = limit.saturating_add(clamped_len(exclude.len()));

        let due = self.questions.find_due(user_id, page, now, filter).await?;
        let mut batch: Vec<FlashCard> = rank_by_priority(due, now)
            .into_iter()
            .map(|candidate| candidate.question)
            .filter(|question| !exclude.contains(&question.id()))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|question| FlashCard {
                question,
                is_review_ahead: false,
            })
            .collect();

        let needed = limit.saturating_sub(clamped_len(batch.len()));
        if needed > 0 {
            let mut exclude_all: Vec<QuestionId> = exclude.to_vec();
            exclude_all.extend(batch.iter().map(|card| card.question.id()));
            let fresh = self
                .questions
                .find_new(user_id, needed, SortDir::Asc, filter, &exclude_all)
                .await?;
            batch.extend(fresh.into_iter().map(|question| FlashCard {
                question,
                is_review_ahead: false,
            }));
        }

        Ok(batch)
    }

    async fn fetch_tier(
        &self,
        tier: Tier,
        user_id: UserId,
        needed: u32,
        now: DateTime<Utc>,
        filter: &QuestionFilter,
        seen: &HashSet<QuestionId>,
    ) -> Result<Vec<Question>, StorageError> {
        match tier {
            Tier::Due => {
                let due = self.questions.find_due(user_id, needed, now, filter).await?;
                Ok(rank_by_priority(due, now)
                    .into_iter()
                    .map(|candidate| candidate.question)
                    .collect())
            }
            Tier::New => {
                let exclude: Vec<QuestionId> = seen.iter().copied().collect();
                self.questions
                    .find_new(user_id, needed, SortDir::Asc, filter, &exclude)
                    .await
            }
            Tier::ReviewAhead => {
                // No exclusion pushdown for this window; over-fetch so
                // already-selected ids dropped by the caller cannot leave
                // the tier short.
                let page = needed.saturating_add(clamped_len(seen.len()));
                let max_date = now + Duration::days(REVIEW_AHEAD_DAYS);
                self.questions
                    .find_review_ahead(user_id, page, now, max_date, filter)
                    .await
            }
            Tier::Future => {
                let exclude: Vec<QuestionId> = seen.iter().copied().collect();
                self.questions
                    .find_future(user_id, needed, now, &exclude, filter)
                    .await
            }
        }
    }
}

fn clamped_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
