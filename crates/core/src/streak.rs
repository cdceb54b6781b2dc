use chrono::{DateTime, NaiveDate, Utc};

use crate::model::ActivityLog;

/// Counts consecutive calendar days of study activity ending today or
/// yesterday relative to `now`.
///
/// The result is order-independent: logs are normalized to UTC calendar days
/// and deduplicated internally, so several logs on one day count once.
/// Returns 0 when there are no logs or when the most recent activity day is
/// more than one day before `now`'s day (the streak is broken).
#[must_use]
pub fn calculate_streak(logs: &[ActivityLog], now: DateTime<Utc>) -> u32 {
    let mut days: Vec<NaiveDate> = logs.iter().map(|log| log.occurred_at.date_naive()).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&latest) = days.first() else {
        return 0;
    };

    if (now.date_naive() - latest).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut previous = latest;
    for &day in &days[1..] {
        if (previous - day).num_days() == 1 {
            streak += 1;
            previous = day;
        } else {
            break;
        }
    }

    streak
}
