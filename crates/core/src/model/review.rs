use chrono::{DateTime, Utc};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when interpreting review input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid rating value: {0}")]
    InvalidRating(u8),
}

//
// ─── RATING ───────────────────────────────────────────────────────────────────
//

/// Three-level self-assessment a user gives after answering a question.
///
/// - `Forgot`: failed to recall; the question comes back tomorrow.
/// - `Hard`: recalled with effort; the interval grows slowly.
/// - `Easy`: recalled comfortably; the interval grows aggressively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Forgot,
    Hard,
    Easy,
}

impl Rating {
    /// Converts a numeric rating (0-2) to a `Rating`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` if the value is not in the range 0-2.
    pub fn from_u8(value: u8) -> Result<Self, ReviewError> {
        match value {
            0 => Ok(Self::Forgot),
            1 => Ok(Self::Hard),
            2 => Ok(Self::Easy),
            _ => Err(ReviewError::InvalidRating(value)),
        }
    }
}

//
// ─── REVIEW STATE ─────────────────────────────────────────────────────────────
//

/// Ease factor assigned to a question that has never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Persisted scheduling state embedded in every question.
///
/// Invariants maintained by the transition engine:
/// - `ease_factor` never drops below 1.3
/// - `next_review_date` is `last_reviewed`-relative (or creation-relative
///   for new questions) plus `interval_days`
/// - `last_reviewed == None` means the question has never been studied and
///   `interval_days` is 0
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewState {
    pub interval_days: u32,
    pub ease_factor: f64,
    pub streak: u32,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review_date: DateTime<Utc>,
}

impl ReviewState {
    /// State for a freshly created question: unstudied and due immediately.
    #[must_use]
    pub fn new_card(created_at: DateTime<Utc>) -> Self {
        Self {
            interval_days: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            streak: 0,
            last_reviewed: None,
            next_review_date: created_at,
        }
    }

    /// Returns true when the question has never been studied.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.last_reviewed.is_none()
    }

    /// Returns true when the question is due for review at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_new() && self.next_review_date <= now
    }

    /// Applies a transition-engine update, stamping the review time.
    #[must_use]
    pub fn after_review(update: &ReviewUpdate, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            interval_days: update.interval_days,
            ease_factor: update.ease_factor,
            streak: update.streak,
            last_reviewed: Some(reviewed_at),
            next_review_date: update.next_review_date,
        }
    }
}

//
// ─── REVIEW UPDATE ────────────────────────────────────────────────────────────
//

/// Output of the transition engine: the next persisted schedule for a question.
///
/// `last_reviewed` is intentionally absent; the caller stamps it when the
/// update is persisted (see `ReviewState::after_review`).
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewUpdate {
    pub interval_days: u32,
    pub ease_factor: f64,
    pub streak: u32,
    pub next_review_date: DateTime<Utc>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn numeric_rating_conversion_works() {
        assert_eq!(Rating::from_u8(0).unwrap(), Rating::Forgot);
        assert_eq!(Rating::from_u8(2).unwrap(), Rating::Easy);
        let err = Rating::from_u8(7).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidRating(7)));
    }

    #[test]
    fn new_card_is_new_and_due_immediately_only_after_study() {
        let now = fixed_now();
        let state = ReviewState::new_card(now);

        assert!(state.is_new());
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
        // new questions are served by the new pool, not the due pool
        assert!(!state.is_due(now));
    }

    #[test]
    fn after_review_stamps_last_reviewed() {
        let now = fixed_now();
        let update = ReviewUpdate {
            interval_days: 4,
            ease_factor: 2.65,
            streak: 1,
            next_review_date: now + Duration::days(4),
        };

        let state = ReviewState::after_review(&update, now);
        assert_eq!(state.last_reviewed, Some(now));
        assert_eq!(state.interval_days, 4);
        assert!(state.is_due(now + Duration::days(5)));
        assert!(!state.is_due(now + Duration::days(3)));
    }
}
