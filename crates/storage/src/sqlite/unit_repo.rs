use async_trait::async_trait;

use srs_core::model::UnitId;

use super::SqliteRepository;
use super::mapping::map_unit_row;
use crate::repository::{StorageError, UnitRecord, UnitRepository};

#[async_trait]
impl UnitRepository for SqliteRepository {
    async fn upsert_unit(&self, unit: &UnitRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO units (id, owner_id, kind, content, source_title)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                kind = excluded.kind,
                content = excluded.content,
                source_title = excluded.source_title
            ",
        )
        .bind(unit.id.to_string())
        .bind(unit.owner_id.to_string())
        .bind(unit.kind.clone())
        .bind(unit.content.clone())
        .bind(unit.source_title.clone())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_unit(&self, unit_id: UnitId) -> Result<Option<UnitRecord>, StorageError> {
        let row = sqlx::query(
            "SELECT id, owner_id, kind, content, source_title FROM units WHERE id = ?1",
        )
        .bind(unit_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_unit_row).transpose()
    }
}
