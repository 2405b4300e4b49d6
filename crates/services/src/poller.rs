use std::sync::Arc;

use tracing::debug;

use flip_core::model::{ReadinessRecord, ValidationStage};

use crate::api::ValidationApi;
use crate::error::ApiError;

/// Asks the node which flips are assigned for a stage and whether each has propagated.
#[derive(Clone)]
pub struct ReadinessPoller {
    api: Arc<dyn ValidationApi>,
}

impl ReadinessPoller {
    #[must_use]
    pub fn new(api: Arc<dyn ValidationApi>) -> Self {
        Self { api }
    }

    /// One readiness poll. The returned order defines flip positions and is kept as is.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the node cannot be reached or rejects the call.
    pub async fn poll(&self, stage: ValidationStage) -> Result<Vec<ReadinessRecord>, ApiError> {
        let records = self.api.list_assigned(stage).await?;
        debug!(
            %stage,
            assigned = records.len(),
            ready = records.iter().filter(|record| record.ready).count(),
            "readiness polled"
        );
        Ok(records)
    }
}
