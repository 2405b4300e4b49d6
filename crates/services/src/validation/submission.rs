use std::sync::Arc;

use tracing::{info, warn};

use flip_core::model::{ValidationSession, ValidationStage};
use storage::repository::ResumeMarkerRepository;

use crate::api::{AnswerRecord, ValidationApi};
use crate::error::ValidationError;

/// Nonce sent with every submission; the node does not check it for answers.
pub const SUBMISSION_NONCE: u64 = 0;
/// Epoch sent with every submission; the node fills in the current one.
pub const SUBMISSION_EPOCH: u64 = 0;

/// Where the client goes once a stage has been submitted.
pub trait StageNavigator: Send + Sync {
    /// `next` is `None` after the final stage.
    fn go_to_next_stage(&self, next: Option<ValidationStage>);
}

/// Build the answer list for `session`, one record per flip in session order.
#[must_use]
pub fn build_submission(session: &ValidationSession) -> Vec<AnswerRecord> {
    session
        .items()
        .iter()
        .map(|item| AnswerRecord {
            hash: item.hash().clone(),
            easy: false,
            answer: item.answer().wire_value(),
        })
        .collect()
}

/// Sends a finished session to the node and moves the client on.
pub struct SubmissionService {
    api: Arc<dyn ValidationApi>,
    markers: Arc<dyn ResumeMarkerRepository>,
    navigator: Arc<dyn StageNavigator>,
}

impl SubmissionService {
    #[must_use]
    pub fn new(
        api: Arc<dyn ValidationApi>,
        markers: Arc<dyn ResumeMarkerRepository>,
        navigator: Arc<dyn StageNavigator>,
    ) -> Self {
        Self {
            api,
            markers,
            navigator,
        }
    }

    /// Submit `session` and navigate to the following stage.
    ///
    /// Returns the stage navigated to. On failure nothing is cleared or navigated,
    /// so the caller can retry with the same session.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotReady` if some flip is unanswered, or
    /// `ValidationError::Api` if the node rejects the submission.
    pub async fn submit(
        &self,
        session: &ValidationSession,
    ) -> Result<Option<ValidationStage>, ValidationError> {
        if !session.can_submit() {
            return Err(ValidationError::NotReady);
        }

        let stage = session.stage();
        let answers = build_submission(session);
        self.api
            .submit_answers(stage, &answers, SUBMISSION_NONCE, SUBMISSION_EPOCH)
            .await?;
        info!(%stage, answers = answers.len(), "answers submitted");

        if let Err(err) = self.markers.clear_marker(stage).await {
            warn!(%stage, error = %err, "failed to clear resume marker");
        }

        let next = stage.next();
        self.navigator.go_to_next_stage(next);
        Ok(next)
    }
}
