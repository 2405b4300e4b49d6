use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flip_core::model::ValidationStage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Local note that a validation stage was entered and not yet submitted.
///
/// Lets a restarted client know it is resuming rather than starting fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeMarker {
    pub stage: ValidationStage,
    pub saved_at: DateTime<Utc>,
}

impl ResumeMarker {
    #[must_use]
    pub fn new(stage: ValidationStage, saved_at: DateTime<Utc>) -> Self {
        Self { stage, saved_at }
    }
}

/// Repository contract for the "stage in progress" marker.
#[async_trait]
pub trait ResumeMarkerRepository: Send + Sync {
    /// Persist or refresh the marker for its stage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the marker cannot be stored.
    async fn save_marker(&self, marker: &ResumeMarker) -> Result<(), StorageError>;

    /// Fetch the marker for `stage`, if one was saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_marker(&self, stage: ValidationStage)
    -> Result<Option<ResumeMarker>, StorageError>;

    /// Remove the marker for `stage`. Clearing a missing marker is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn clear_marker(&self, stage: ValidationStage) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    markers: Arc<Mutex<HashMap<ValidationStage, ResumeMarker>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeMarkerRepository for InMemoryRepository {
    async fn save_marker(&self, marker: &ResumeMarker) -> Result<(), StorageError> {
        let mut guard = self
            .markers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(marker.stage, marker.clone());
        Ok(())
    }

    async fn get_marker(
        &self,
        stage: ValidationStage,
    ) -> Result<Option<ResumeMarker>, StorageError> {
        let guard = self
            .markers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&stage).cloned())
    }

    async fn clear_marker(&self, stage: ValidationStage) -> Result<(), StorageError> {
        let mut guard = self
            .markers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&stage);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub resume_markers: Arc<dyn ResumeMarkerRepository>,
}
