use std::sync::Arc;

use srs_core::Clock;
use srs_core::model::UserId;
use srs_core::streak::calculate_streak;
use storage::repository::ActivityRepository;

use crate::error::StatsError;

/// More history than any plausible streak; one entry per study event, so a
/// year of heavy use stays well under this.
const ACTIVITY_PAGE: u32 = 5_000;

/// Read-side statistics over the activity log.
pub struct StatsService {
    activity: Arc<dyn ActivityRepository>,
    clock: Clock,
}

impl StatsService {
    #[must_use]
    pub fn new(activity: Arc<dyn ActivityRepository>) -> Self {
        Self::with_clock(activity, Clock::Default)
    }

    #[must_use]
    pub fn with_clock(activity: Arc<dyn ActivityRepository>, clock: Clock) -> Self {
        Self { activity, clock }
    }

    /// Consecutive calendar days of study ending today or yesterday (UTC).
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on query failure.
    pub async fn current_streak(&self, user_id: UserId) -> Result<u32, StatsError> {
        let logs = self.activity.list_activity(user_id, ACTIVITY_PAGE).await?;
        Ok(calculate_streak(&logs, self.clock.now()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use srs_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service(repo: &Arc<InMemoryRepository>) -> StatsService {
        StatsService::with_clock(
            Arc::clone(repo) as Arc<dyn ActivityRepository>,
            fixed_clock(),
        )
    }

    #[tokio::test]
    async fn streak_counts_consecutive_days_back_from_today() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::random();
        let now = fixed_now();

        for days_ago in [0, 1, 2, 4] {
            repo.record_activity(user, now - Duration::days(days_ago))
                .await
                .unwrap();
        }

        assert_eq!(service(&repo).current_streak(user).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn streak_is_zero_without_recent_activity() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::random();

        assert_eq!(service(&repo).current_streak(user).await.unwrap(), 0);

        repo.record_activity(user, fixed_now() - Duration::days(3))
            .await
            .unwrap();
        assert_eq!(service(&repo).current_streak(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn activity_is_scoped_per_user() {
        let repo = Arc::new(InMemoryRepository::new());
        let studying = UserId::random();
        let idle = UserId::random();

        repo.record_activity(studying, fixed_now()).await.unwrap();

        assert_eq!(service(&repo).current_streak(studying).await.unwrap(), 1);
        assert_eq!(service(&repo).current_streak(idle).await.unwrap(), 0);
    }
}
