use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use srs_core::model::{
    ActivityLog, Question, QuestionId, ReviewState, SubjectId, TopicId, UnitId, UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Sort direction for creation-time ordering of the new-question pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// Conjunctive subject/topic constraint applied at every selection tier.
///
/// An empty filter matches everything. When topics are present a question
/// matches if it carries at least one of them; when a subject is present it
/// must match exactly. Both constraints apply together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub subject: Option<SubjectId>,
    pub topics: Vec<TopicId>,
}

impl QuestionFilter {
    /// Matches every question.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn by_subject(subject: SubjectId) -> Self {
        Self {
            subject: Some(subject),
            topics: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_topics(mut self, topics: Vec<TopicId>) -> Self {
        self.topics = topics;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.topics.is_empty()
    }

    /// In-memory predicate mirroring the SQL constraint.
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        if let Some(subject) = self.subject {
            if question.subject_id() != subject {
                return false;
            }
        }
        if !self.topics.is_empty()
            && !question.topic_ids().iter().any(|t| self.topics.contains(t))
        {
            return false;
        }
        true
    }
}

/// Persisted shape for a study unit.
///
/// Units are produced by the (out-of-scope) ingestion pipeline; the core only
/// ever performs an ownership-gated read of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub id: UnitId,
    pub owner_id: UserId,
    pub kind: String,
    pub content: String,
    pub source_title: String,
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for questions and their embedded review state.
///
/// All reads are scoped to a user; `update_review_state` returns `None`
/// instead of failing when the question is missing or owned by someone else,
/// and the service layer translates that into its own not-found error.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, user_id: UserId, question: &Question)
    -> Result<(), StorageError>;

    /// Questions with `next_review_date <= now` that have been studied at
    /// least once, ordered by `next_review_date` ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn find_due(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError>;

    /// Never-studied questions ordered by creation time, honoring `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn find_new(
        &self,
        user_id: UserId,
        limit: u32,
        sort: SortDir,
        filter: &QuestionFilter,
        exclude: &[QuestionId],
    ) -> Result<Vec<Question>, StorageError>;

    /// Questions with `next_review_date` in `(now, max_date]`, ordered
    /// ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn find_review_ahead(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        max_date: DateTime<Utc>,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError>;

    /// Questions with `next_review_date > now`, honoring `exclude`, ordered
    /// ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn find_future(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        exclude: &[QuestionId],
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError>;

    /// Current review state for one question, `None` if missing/unowned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn find_review_state(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<ReviewState>, StorageError>;

    /// Persists a new review state; returns the stored `next_review_date`,
    /// or `None` when no owned row was updated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn update_review_state(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        state: &ReviewState,
    ) -> Result<Option<DateTime<Utc>>, StorageError>;
}

/// Repository contract for study units.
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Persist or update a unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the unit cannot be stored.
    async fn upsert_unit(&self, unit: &UnitRecord) -> Result<(), StorageError>;

    /// Fetch a unit by id regardless of owner; the service layer enforces
    /// ownership.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn get_unit(&self, unit_id: UnitId) -> Result<Option<UnitRecord>, StorageError>;
}

/// Repository contract for the study-activity log behind streaks.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Append one activity entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn record_activity(
        &self,
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Most recent activity first, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failure.
    async fn list_activity(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<ActivityLog>, StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<(UserId, QuestionId), Question>>>,
    units: Arc<Mutex<HashMap<UnitId, UnitRecord>>>,
    activity: Arc<Mutex<Vec<(UserId, DateTime<Utc>)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_questions<F>(
        &self,
        user_id: UserId,
        predicate: F,
    ) -> Result<Vec<Question>, StorageError>
    where
        F: Fn(&Question) -> bool,
    {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|((uid, _), q)| *uid == user_id && predicate(q))
            .map(|(_, q)| q.clone())
            .collect())
    }
}

fn truncate(mut questions: Vec<Question>, limit: u32) -> Vec<Question> {
    questions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    questions
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(
        &self,
        user_id: UserId,
        question: &Question,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((user_id, question.id()), question.clone());
        Ok(())
    }

    async fn find_due(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let mut due = self.collect_questions(user_id, |q| {
            q.review().is_due(now) && filter.matches(q)
        })?;
        due.sort_by_key(|q| (q.review().next_review_date, q.id().value()));
        Ok(truncate(due, limit))
    }

    async fn find_new(
        &self,
        user_id: UserId,
        limit: u32,
        sort: SortDir,
        filter: &QuestionFilter,
        exclude: &[QuestionId],
    ) -> Result<Vec<Question>, StorageError> {
        let mut fresh = self.collect_questions(user_id, |q| {
            q.review().is_new() && filter.matches(q) && !exclude.contains(&q.id())
        })?;
        fresh.sort_by_key(|q| (q.created_at(), q.id().value()));
        if sort == SortDir::Desc {
            fresh.reverse();
        }
        Ok(truncate(fresh, limit))
    }

    async fn find_review_ahead(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        max_date: DateTime<Utc>,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let mut ahead = self.collect_questions(user_id, |q| {
            let next = q.review().next_review_date;
            next > now && next <= max_date && filter.matches(q)
        })?;
        ahead.sort_by_key(|q| (q.review().next_review_date, q.id().value()));
        Ok(truncate(ahead, limit))
    }

    async fn find_future(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        exclude: &[QuestionId],
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let mut future = self.collect_questions(user_id, |q| {
            q.review().next_review_date > now
                && filter.matches(q)
                && !exclude.contains(&q.id())
        })?;
        future.sort_by_key(|q| (q.review().next_review_date, q.id().value()));
        Ok(truncate(future, limit))
    }

    async fn find_review_state(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<ReviewState>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(user_id, question_id))
            .map(|q| q.review().clone()))
    }

    async fn update_review_state(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        state: &ReviewState,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.get_mut(&(user_id, question_id)) {
            Some(question) => {
                question.set_review(state.clone());
                Ok(Some(state.next_review_date))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UnitRepository for InMemoryRepository {
    async fn upsert_unit(&self, unit: &UnitRecord) -> Result<(), StorageError> {
        let mut guard = self
            .units
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn get_unit(&self, unit_id: UnitId) -> Result<Option<UnitRecord>, StorageError> {
        let guard = self
            .units
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&unit_id).cloned())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryRepository {
    async fn record_activity(
        &self,
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .activity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push((user_id, occurred_at));
        Ok(())
    }

    async fn list_activity(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<ActivityLog>, StorageError> {
        let guard = self
            .activity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut logs: Vec<ActivityLog> = guard
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, at)| ActivityLog::new(*at))
            .collect();
        logs.sort_by_key(|log| std::cmp::Reverse(log.occurred_at));
        logs.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(logs)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use srs_core::model::QuestionContent;
    use srs_core::time::fixed_now;

    fn build_question(subject: SubjectId) -> Question {
        Question::new(
            QuestionId::random(),
            subject,
            Vec::new(),
            QuestionContent::Open {
                prompt: "Q".into(),
                answer: "A".into(),
            },
            fixed_now() - Duration::days(10),
        )
    }

    fn make_due(question: &mut Question, days_overdue: i64) {
        let now = fixed_now();
        question.set_review(ReviewState {
            interval_days: 4,
            ease_factor: 2.5,
            streak: 1,
            last_reviewed: Some(now - Duration::days(days_overdue + 4)),
            next_review_date: now - Duration::days(days_overdue),
        });
    }

    fn make_scheduled(question: &mut Question, days_ahead: i64) {
        let now = fixed_now();
        question.set_review(ReviewState {
            interval_days: 4,
            ease_factor: 2.5,
            streak: 1,
            last_reviewed: Some(now - Duration::days(1)),
            next_review_date: now + Duration::days(days_ahead),
        });
    }

    #[tokio::test]
    async fn due_pool_excludes_new_and_orders_ascending() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let subject = SubjectId::random();
        let now = fixed_now();

        let mut overdue_far = build_question(subject);
        make_due(&mut overdue_far, 5);
        let mut overdue_near = build_question(subject);
        make_due(&mut overdue_near, 1);
        let never_studied = build_question(subject);

        for q in [&overdue_far, &overdue_near, &never_studied] {
            repo.upsert_question(user, q).await.unwrap();
        }

        let due = repo
            .find_due(user, 10, now, &QuestionFilter::none())
            .await
            .unwrap();

        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id(), overdue_far.id());
        assert_eq!(due[1].id(), overdue_near.id());
    }

    #[tokio::test]
    async fn new_pool_honors_exclusions_and_limit() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let subject = SubjectId::random();

        let a = build_question(subject);
        let b = build_question(subject);
        let c = build_question(subject);
        for q in [&a, &b, &c] {
            repo.upsert_question(user, q).await.unwrap();
        }

        let fresh = repo
            .find_new(user, 10, SortDir::Asc, &QuestionFilter::none(), &[b.id()])
            .await
            .unwrap();
        assert_eq!(fresh.len(), 2);
        assert!(fresh.iter().all(|q| q.id() != b.id()));

        let capped = repo
            .find_new(user, 1, SortDir::Asc, &QuestionFilter::none(), &[])
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn review_ahead_window_is_half_open() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let subject = SubjectId::random();
        let now = fixed_now();

        let mut due_now = build_question(subject);
        make_due(&mut due_now, 0);
        let mut in_window = build_question(subject);
        make_scheduled(&mut in_window, 2);
        let mut past_window = build_question(subject);
        make_scheduled(&mut past_window, 5);

        for q in [&due_now, &in_window, &past_window] {
            repo.upsert_question(user, q).await.unwrap();
        }

        let ahead = repo
            .find_review_ahead(user, 10, now, now + Duration::days(3), &QuestionFilter::none())
            .await
            .unwrap();

        assert_eq!(ahead.len(), 1);
        assert_eq!(ahead[0].id(), in_window.id());
    }

    #[tokio::test]
    async fn subject_and_topic_filters_are_conjunctive() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let subject = SubjectId::random();
        let topic = TopicId::random();

        let mut tagged = Question::new(
            QuestionId::random(),
            subject,
            vec![topic],
            QuestionContent::Open {
                prompt: "Q".into(),
                answer: "A".into(),
            },
            fixed_now(),
        );
        make_due(&mut tagged, 1);
        let mut untagged = build_question(subject);
        make_due(&mut untagged, 1);
        let mut other_subject = build_question(SubjectId::random());
        make_due(&mut other_subject, 1);

        for q in [&tagged, &untagged, &other_subject] {
            repo.upsert_question(user, q).await.unwrap();
        }

        let filter = QuestionFilter::by_subject(subject).with_topics(vec![topic]);
        let due = repo.find_due(user, 10, fixed_now(), &filter).await.unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id(), tagged.id());
    }

    #[tokio::test]
    async fn update_review_state_is_ownership_scoped() {
        let repo = InMemoryRepository::new();
        let owner = UserId::random();
        let stranger = UserId::random();
        let question = build_question(SubjectId::random());
        repo.upsert_question(owner, &question).await.unwrap();

        let state = ReviewState {
            interval_days: 1,
            ease_factor: 2.5,
            streak: 1,
            last_reviewed: Some(fixed_now()),
            next_review_date: fixed_now() + Duration::days(1),
        };

        let denied = repo
            .update_review_state(stranger, question.id(), &state)
            .await
            .unwrap();
        assert!(denied.is_none());

        let accepted = repo
            .update_review_state(owner, question.id(), &state)
            .await
            .unwrap();
        assert_eq!(accepted, Some(state.next_review_date));

        let stored = repo
            .find_review_state(owner, question.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, state);
    }

    #[tokio::test]
    async fn activity_lists_most_recent_first_per_user() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let other = UserId::random();
        let now = fixed_now();

        repo.record_activity(user, now - Duration::days(2)).await.unwrap();
        repo.record_activity(user, now).await.unwrap();
        repo.record_activity(other, now - Duration::days(1)).await.unwrap();

        let logs = repo.list_activity(user, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].occurred_at, now);
        assert_eq!(logs[1].occurred_at, now - Duration::days(2));
    }
}
