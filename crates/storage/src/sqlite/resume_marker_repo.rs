use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flip_core::model::ValidationStage;
use sqlx::Row;

use crate::repository::{ResumeMarker, ResumeMarkerRepository, StorageError};

use super::SqliteRepository;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ResumeMarkerRepository for SqliteRepository {
    async fn save_marker(&self, marker: &ResumeMarker) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO resume_markers (stage, saved_at)
            VALUES (?1, ?2)
            ON CONFLICT(stage) DO UPDATE SET
                saved_at = excluded.saved_at
            ",
        )
        .bind(marker.stage.as_str())
        .bind(marker.saved_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_marker(
        &self,
        stage: ValidationStage,
    ) -> Result<Option<ResumeMarker>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT stage, saved_at
            FROM resume_markers
            WHERE stage = ?1
            ",
        )
        .bind(stage.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw_stage: String = row.try_get("stage").map_err(ser)?;
        let saved_at: DateTime<Utc> = row.try_get("saved_at").map_err(ser)?;
        let stage = raw_stage.parse::<ValidationStage>().map_err(ser)?;

        Ok(Some(ResumeMarker { stage, saved_at }))
    }

    async fn clear_marker(&self, stage: ValidationStage) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM resume_markers WHERE stage = ?1")
            .bind(stage.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
