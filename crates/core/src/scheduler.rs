use chrono::{DateTime, Duration, Utc};

use crate::model::{Rating, ReviewState, ReviewUpdate};

//
// ─── TUNING CONSTANTS ──────────────────────────────────────────────────────────
//

/// Ease factor floor; no amount of failures pushes a question below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Subtracted from the ease factor on a failed review.
pub const FORGOT_EASE_PENALTY: f64 = 0.2;
/// Added to the ease factor on an easy review.
pub const EASY_EASE_BONUS: f64 = 0.15;
/// Interval growth for a hard (recalled-with-effort) review.
pub const HARD_INTERVAL_MULTIPLIER: f64 = 1.2;
/// Extra interval growth applied on top of the ease factor for easy reviews.
pub const EASY_INTERVAL_MULTIPLIER: f64 = 1.3;

//
// ─── TRANSITION ENGINE ─────────────────────────────────────────────────────────
//

/// Computes the next scheduling state for a question after a review.
///
/// Pure and total: no clock reads, no I/O, no failure modes. The caller
/// persists the returned update (see `ReviewState::after_review`).
///
/// Same-day guard: if the question was already reviewed on the same UTC
/// calendar day as `now` and the rating is not `Forgot`, the state is
/// returned unchanged except that `next_review_date` is recomputed from
/// `now`. Repeatedly rating a card `Easy` within one day therefore cannot
/// inflate its ease or interval. `Forgot` is always honored; admitting
/// failure is never throttled.
///
/// Transition table:
///
/// | rating | interval'                    | ease'            | streak'    |
/// |--------|------------------------------|------------------|------------|
/// | Forgot | 1                            | max(1.3, e − .2) | 0          |
/// | Hard   | ceil(interval × 1.2)         | unchanged        | streak + 1 |
/// | Easy   | ceil(interval × e × 1.3)     | e + 0.15         | streak + 1 |
///
/// A non-`Forgot` result of 0 days (new card) is bumped to 1 so a studied
/// question is never due again the same instant.
///
/// # Examples
///
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use srs_core::model::{Rating, ReviewState};
/// # use srs_core::scheduler::next_review;
/// let now = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
/// let state = ReviewState {
///     interval_days: 3,
///     ease_factor: 2.5,
///     streak: 2,
///     last_reviewed: Some(now - chrono::Duration::days(3)),
///     next_review_date: now,
/// };
///
/// let update = next_review(Rating::Easy, &state, now);
/// assert_eq!(update.interval_days, 10); // ceil(3 × 2.5 × 1.3)
/// assert_eq!(update.streak, 3);
/// ```
#[must_use]
pub fn next_review(rating: Rating, current: &ReviewState, now: DateTime<Utc>) -> ReviewUpdate {
    if rating != Rating::Forgot && reviewed_today(current, now) {
        return ReviewUpdate {
            interval_days: current.interval_days,
            ease_factor: current.ease_factor,
            streak: current.streak,
            next_review_date: add_days(now, current.interval_days),
        };
    }

    let (mut interval_days, ease_factor, streak) = match rating {
        Rating::Forgot => (
            1,
            (current.ease_factor - FORGOT_EASE_PENALTY).max(MIN_EASE_FACTOR),
            0,
        ),
        Rating::Hard => (
            ceil_days(f64::from(current.interval_days) * HARD_INTERVAL_MULTIPLIER),
            current.ease_factor,
            current.streak + 1,
        ),
        Rating::Easy => (
            ceil_days(
                f64::from(current.interval_days) * current.ease_factor * EASY_INTERVAL_MULTIPLIER,
            ),
            current.ease_factor + EASY_EASE_BONUS,
            current.streak + 1,
        ),
    };

    // New-card floor: a successful first review always schedules at least a day out.
    if rating != Rating::Forgot && interval_days == 0 {
        interval_days = 1;
    }

    ReviewUpdate {
        interval_days,
        ease_factor,
        streak,
        next_review_date: add_days(now, interval_days),
    }
}

/// True when the question's last review falls on the same UTC calendar day
/// as `now` (Y/M/D comparison, not a rolling 24-hour window).
fn reviewed_today(state: &ReviewState, now: DateTime<Utc>) -> bool {
    state
        .last_reviewed
        .is_some_and(|last| last.date_naive() == now.date_naive())
}

fn add_days(from: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    from + Duration::days(i64::from(days))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_days(value: f64) -> u32 {
    let ceiled = value.ceil();
    if ceiled <= 0.0 {
        0
    } else if ceiled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        ceiled as u32
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
