use sqlx::Row;
use uuid::Uuid;

use srs_core::model::{
    Question, QuestionContent, QuestionId, ReviewState, SubjectId, TopicId, UnitId, UserId,
};

use crate::repository::{StorageError, UnitRecord};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn uuid_from_str(field: &'static str, s: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(s).map_err(|_| StorageError::Serialization(format!("invalid {field} uuid")))
}

pub(crate) fn topic_ids_json(topic_ids: &[TopicId]) -> Result<String, StorageError> {
    let raw: Vec<Uuid> = topic_ids.iter().map(TopicId::value).collect();
    serde_json::to_string(&raw).map_err(ser)
}

pub(crate) fn content_json(content: &QuestionContent) -> Result<String, StorageError> {
    serde_json::to_string(content).map_err(ser)
}

pub(crate) fn map_review_row(row: &sqlx::sqlite::SqliteRow) -> Result<ReviewState, StorageError> {
    let interval_i64: i64 = row.try_get("interval_days").map_err(ser)?;
    let streak_i64: i64 = row.try_get("streak").map_err(ser)?;

    Ok(ReviewState {
        interval_days: u32::try_from(interval_i64)
            .map_err(|_| StorageError::Serialization("interval_days out of range".into()))?,
        ease_factor: row.try_get("ease_factor").map_err(ser)?,
        streak: u32::try_from(streak_i64)
            .map_err(|_| StorageError::Serialization("streak out of range".into()))?,
        last_reviewed: row.try_get("last_reviewed").map_err(ser)?,
        next_review_date: row.try_get("next_review_date").map_err(ser)?,
    })
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let subject_id: String = row.try_get("subject_id").map_err(ser)?;

    let topic_ids_raw: String = row.try_get("topic_ids").map_err(ser)?;
    let topic_uuids: Vec<Uuid> = serde_json::from_str(&topic_ids_raw).map_err(ser)?;

    let content_raw: String = row.try_get("content").map_err(ser)?;
    let content: QuestionContent = serde_json::from_str(&content_raw).map_err(ser)?;

    Ok(Question::from_persisted(
        QuestionId::new(uuid_from_str("question id", &id)?),
        SubjectId::new(uuid_from_str("subject_id", &subject_id)?),
        topic_uuids.into_iter().map(TopicId::new).collect(),
        content,
        row.try_get("created_at").map_err(ser)?,
        map_review_row(row)?,
    ))
}

pub(crate) fn map_unit_row(row: &sqlx::sqlite::SqliteRow) -> Result<UnitRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let owner_id: String = row.try_get("owner_id").map_err(ser)?;

    Ok(UnitRecord {
        id: UnitId::new(uuid_from_str("unit id", &id)?),
        owner_id: UserId::new(uuid_from_str("owner_id", &owner_id)?),
        kind: row.try_get("kind").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        source_title: row.try_get("source_title").map_err(ser)?,
    })
}
