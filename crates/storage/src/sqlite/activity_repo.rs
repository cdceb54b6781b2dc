use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use srs_core::model::{ActivityLog, UserId};

use super::SqliteRepository;
use super::mapping::ser;
use crate::repository::{ActivityRepository, StorageError};

#[async_trait]
impl ActivityRepository for SqliteRepository {
    async fn record_activity(
        &self,
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO activity_logs (user_id, occurred_at) VALUES (?1, ?2)")
            .bind(user_id.to_string())
            .bind(occurred_at)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_activity(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<ActivityLog>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT occurred_at FROM activity_logs
            WHERE user_id = ?1
            ORDER BY occurred_at DESC
            LIMIT ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let occurred_at: DateTime<Utc> = row.try_get("occurred_at").map_err(ser)?;
                Ok(ActivityLog::new(occurred_at))
            })
            .collect()
    }
}
