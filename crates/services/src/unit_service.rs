use std::sync::Arc;

use srs_core::model::{UnitId, UserId};
use storage::repository::UnitRepository;

use crate::error::UnitServiceError;

/// Unit payload handed to callers; never exposes the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitContent {
    pub content: String,
    pub kind: String,
    pub source_title: String,
}

/// Ownership-gated read access to study units.
pub struct UnitService {
    units: Arc<dyn UnitRepository>,
}

impl UnitService {
    #[must_use]
    pub fn new(units: Arc<dyn UnitRepository>) -> Self {
        Self { units }
    }

    /// Fetches a unit's content for its owner.
    ///
    /// Existence is checked before ownership, so a caller probing someone
    /// else's unit learns that it exists but nothing more.
    ///
    /// # Errors
    ///
    /// Returns `UnitServiceError::NotFound` for a missing unit,
    /// `UnitServiceError::Authorization` when the unit belongs to another
    /// user, `UnitServiceError::Storage` on query failure.
    pub async fn fetch_unit_content(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<UnitContent, UnitServiceError> {
        let unit = self
            .units
            .get_unit(unit_id)
            .await?
            .ok_or(UnitServiceError::NotFound)?;

        if unit.owner_id != user_id {
            return Err(UnitServiceError::Authorization);
        }

        Ok(UnitContent {
            content: unit.content,
            kind: unit.kind,
            source_title: unit.source_title,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
