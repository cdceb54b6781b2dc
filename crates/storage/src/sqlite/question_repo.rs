use async_trait::async_trait;
use chrono::{DateTime, Utc};

use srs_core::model::{Question, QuestionId, ReviewState, UserId};

use super::SqliteRepository;
use super::mapping::{content_json, map_question_row, map_review_row, topic_ids_json};
use crate::repository::{QuestionFilter, QuestionRepository, SortDir, StorageError};

const QUESTION_COLUMNS: &str = "id, user_id, subject_id, topic_ids, content, created_at, \
     interval_days, ease_factor, streak, last_reviewed, next_review_date";

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

fn conn_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Appends the conjunctive subject/topic constraint as SQL; binds must be
/// added in the same order via `bind_filter`.
fn push_filter_sql(sql: &mut String, filter: &QuestionFilter) {
    if filter.subject.is_some() {
        sql.push_str(" AND subject_id = ?");
    }
    if !filter.topics.is_empty() {
        sql.push_str(
            " AND EXISTS (SELECT 1 FROM json_each(questions.topic_ids) WHERE json_each.value IN (",
        );
        for i in 0..filter.topics.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
        }
        sql.push_str("))");
    }
}

fn bind_filter<'q>(mut q: SqliteQuery<'q>, filter: &QuestionFilter) -> SqliteQuery<'q> {
    if let Some(subject) = filter.subject {
        q = q.bind(subject.to_string());
    }
    for topic in &filter.topics {
        q = q.bind(topic.to_string());
    }
    q
}

fn push_exclude_sql(sql: &mut String, exclude: &[QuestionId]) {
    if exclude.is_empty() {
        return;
    }
    sql.push_str(" AND id NOT IN (");
    for i in 0..exclude.len() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('?');
    }
    sql.push(')');
}

fn bind_exclude<'q>(mut q: SqliteQuery<'q>, exclude: &[QuestionId]) -> SqliteQuery<'q> {
    for id in exclude {
        q = q.bind(id.to_string());
    }
    q
}

impl SqliteRepository {
    async fn fetch_questions(&self, query: SqliteQuery<'_>) -> Result<Vec<Question>, StorageError> {
        let rows = query.fetch_all(&self.pool).await.map_err(conn_err)?;
        rows.iter().map(map_question_row).collect()
    }
}

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(
        &self,
        user_id: UserId,
        question: &Question,
    ) -> Result<(), StorageError> {
        let review = question.review();
        sqlx::query(
            r"
            INSERT INTO questions (
                id, user_id, subject_id, topic_ids, content, created_at,
                interval_days, ease_factor, streak, last_reviewed, next_review_date
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id, user_id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                subject_id = excluded.subject_id,
                topic_ids = excluded.topic_ids,
                content = excluded.content,
                interval_days = excluded.interval_days,
                ease_factor = excluded.ease_factor,
                streak = excluded.streak,
                last_reviewed = excluded.last_reviewed,
                next_review_date = excluded.next_review_date
            ",
        )
        .bind(question.id().to_string())
        .bind(user_id.to_string())
        .bind(question.subject_id().to_string())
        .bind(topic_ids_json(question.topic_ids())?)
        .bind(content_json(question.content())?)
        .bind(question.created_at())
        .bind(i64::from(review.interval_days))
        .bind(review.ease_factor)
        .bind(i64::from(review.streak))
        .bind(review.last_reviewed)
        .bind(review.next_review_date)
        .execute(&self.pool)
        .await
        .map_err(conn_err)?;

        Ok(())
    }

    async fn find_due(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let mut sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE user_id = ? AND last_reviewed IS NOT NULL AND next_review_date <= ?"
        );
        push_filter_sql(&mut sql, filter);
        sql.push_str(" ORDER BY next_review_date ASC, id ASC LIMIT ?");

        let mut q = sqlx::query(&sql).bind(user_id.to_string()).bind(now);
        q = bind_filter(q, filter);
        q = q.bind(i64::from(limit));

        self.fetch_questions(q).await
    }

    async fn find_new(
        &self,
        user_id: UserId,
        limit: u32,
        sort: SortDir,
        filter: &QuestionFilter,
        exclude: &[QuestionId],
    ) -> Result<Vec<Question>, StorageError> {
        let mut sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE user_id = ? AND last_reviewed IS NULL"
        );
        push_filter_sql(&mut sql, filter);
        push_exclude_sql(&mut sql, exclude);
        sql.push_str(match sort {
            SortDir::Asc => " ORDER BY created_at ASC, id ASC LIMIT ?",
            SortDir::Desc => " ORDER BY created_at DESC, id DESC LIMIT ?",
        });

        let mut q = sqlx::query(&sql).bind(user_id.to_string());
        q = bind_filter(q, filter);
        q = bind_exclude(q, exclude);
        q = q.bind(i64::from(limit));

        self.fetch_questions(q).await
    }

    async fn find_review_ahead(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        max_date: DateTime<Utc>,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let mut sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE user_id = ? AND next_review_date > ? AND next_review_date <= ?"
        );
        push_filter_sql(&mut sql, filter);
        sql.push_str(" ORDER BY next_review_date ASC, id ASC LIMIT ?");

        let mut q = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(now)
            .bind(max_date);
        q = bind_filter(q, filter);
        q = q.bind(i64::from(limit));

        self.fetch_questions(q).await
    }

    async fn find_future(
        &self,
        user_id: UserId,
        limit: u32,
        now: DateTime<Utc>,
        exclude: &[QuestionId],
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let mut sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE user_id = ? AND next_review_date > ?"
        );
        push_filter_sql(&mut sql, filter);
        push_exclude_sql(&mut sql, exclude);
        sql.push_str(" ORDER BY next_review_date ASC, id ASC LIMIT ?");

        let mut q = sqlx::query(&sql).bind(user_id.to_string()).bind(now);
        q = bind_filter(q, filter);
        q = bind_exclude(q, exclude);
        q = q.bind(i64::from(limit));

        self.fetch_questions(q).await
    }

    async fn find_review_state(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<ReviewState>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT interval_days, ease_factor, streak, last_reviewed, next_review_date
            FROM questions
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(question_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.as_ref().map(map_review_row).transpose()
    }

    async fn update_review_state(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        state: &ReviewState,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let result = sqlx::query(
            r"
            UPDATE questions SET
                interval_days = ?1,
                ease_factor = ?2,
                streak = ?3,
                last_reviewed = ?4,
                next_review_date = ?5
            WHERE id = ?6 AND user_id = ?7
            ",
        )
        .bind(i64::from(state.interval_days))
        .bind(state.ease_factor)
        .bind(i64::from(state.streak))
        .bind(state.last_reviewed)
        .bind(state.next_review_date)
        .bind(question_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(conn_err)?;

        // zero rows means missing or owned by someone else; the service
        // layer translates this into its not-found error
        if result.rows_affected() == 0 {
            Ok(None)
        } else {
            Ok(Some(state.next_review_date))
        }
    }
}
