use std::sync::Arc;

use flip_core::model::ValidationStage;
use services::{PollTask, SubmissionService, ValidationLoopService};

use crate::views::ViewError;
use crate::vm::{ValidationVm, start_validation};

pub trait UiApp: Send + Sync {
    fn initial_stage(&self) -> ValidationStage;

    fn validation_loop(&self) -> Arc<ValidationLoopService>;
    fn submissions(&self) -> Arc<SubmissionService>;
}

#[derive(Clone)]
pub struct AppContext {
    initial_stage: ValidationStage,

    validation_loop: Arc<ValidationLoopService>,
    submissions: Arc<SubmissionService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            initial_stage: app.initial_stage(),
            validation_loop: app.validation_loop(),
            submissions: app.submissions(),
        }
    }

    #[must_use]
    pub fn initial_stage(&self) -> ValidationStage {
        self.initial_stage
    }

    #[must_use]
    pub fn validation_loop(&self) -> Arc<ValidationLoopService> {
        Arc::clone(&self.validation_loop)
    }

    #[must_use]
    pub fn submissions(&self) -> Arc<SubmissionService> {
        Arc::clone(&self.submissions)
    }

    /// Enter `stage` and return its view-model plus the running poll task.
    ///
    /// # Errors
    ///
    /// Returns `ViewError` if the stage cannot be entered.
    pub async fn enter_stage(
        &self,
        stage: ValidationStage,
    ) -> Result<(ValidationVm, PollTask), ViewError> {
        start_validation(&self.validation_loop, self.submissions(), stage).await
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
