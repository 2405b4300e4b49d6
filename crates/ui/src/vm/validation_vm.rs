use std::sync::Arc;

use flip_core::model::{Answer, DecodedFlip, ValidationStage};
use services::{
    PollTask, SessionHandle, SessionProgress, SubmissionService, ValidationLoopService,
};

use crate::views::{ViewError, ViewState, view_state_from_result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationIntent {
    Prev,
    Next,
    Pick(usize),
    Answer(Answer),
    ReportAbuse,
    Submit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    Continue,
    Submitted { next: Option<ValidationStage> },
}

/// One row of the flip strip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlipSlotVm {
    pub position: usize,
    pub hash: String,
    pub ready: bool,
    pub loaded: bool,
    pub answer: Answer,
    pub current: bool,
}

pub struct ValidationVm {
    handle: SessionHandle,
    submissions: Arc<SubmissionService>,
    resumed: bool,
    submit_state: ViewState<Option<ValidationStage>>,
}

impl ValidationVm {
    #[must_use]
    pub fn new(handle: SessionHandle, submissions: Arc<SubmissionService>) -> Self {
        Self {
            handle,
            submissions,
            resumed: false,
            submit_state: ViewState::Idle,
        }
    }

    #[must_use]
    pub fn resumed(mut self, resumed: bool) -> Self {
        self.resumed = resumed;
        self
    }

    #[must_use]
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    #[must_use]
    pub fn stage(&self) -> ValidationStage {
        self.handle.stage()
    }

    #[must_use]
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.handle.snapshot().current_index()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.handle.snapshot().len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.handle.progress()
    }

    /// The flip under the cursor, once it has been fetched and decoded.
    #[must_use]
    pub fn current_flip(&self) -> Option<DecodedFlip> {
        self.handle
            .snapshot()
            .current_item()
            .and_then(|item| item.flip().cloned())
    }

    #[must_use]
    pub fn answers(&self) -> Vec<Answer> {
        self.handle.snapshot().answers()
    }

    #[must_use]
    pub fn readiness(&self) -> Vec<bool> {
        self.handle
            .snapshot()
            .items()
            .iter()
            .map(|item| item.is_ready())
            .collect()
    }

    #[must_use]
    pub fn slots(&self) -> Vec<FlipSlotVm> {
        let session = self.handle.snapshot();
        session
            .items()
            .iter()
            .enumerate()
            .map(|(position, item)| FlipSlotVm {
                position,
                hash: item.hash().short().to_string(),
                ready: item.is_ready(),
                loaded: item.flip().is_some(),
                answer: item.answer(),
                current: position == session.current_index(),
            })
            .collect()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.handle.snapshot().can_submit()
    }

    #[must_use]
    pub fn submit_state(&self) -> &ViewState<Option<ValidationStage>> {
        &self.submit_state
    }

    /// # Errors
    ///
    /// Returns `ViewError::NotReady` when submitting with unanswered flips.
    /// Returns `ViewError::Unknown` for other submission failures.
    pub async fn dispatch(
        &mut self,
        intent: ValidationIntent,
    ) -> Result<ValidationOutcome, ViewError> {
        match intent {
            ValidationIntent::Prev => self.handle.prev(),
            ValidationIntent::Next => self.handle.next(),
            ValidationIntent::Pick(position) => self.handle.pick(position),
            ValidationIntent::Answer(answer) => self.handle.answer(answer),
            ValidationIntent::ReportAbuse => self.handle.report_inappropriate(),
            ValidationIntent::Submit => return self.submit().await,
        }
        Ok(ValidationOutcome::Continue)
    }

    async fn submit(&mut self) -> Result<ValidationOutcome, ViewError> {
        self.submit_state = ViewState::Loading;
        let session = self.handle.snapshot();
        let result = self
            .submissions
            .submit(&session)
            .await
            .map_err(|err| ViewError::from(&err));
        self.submit_state = view_state_from_result(result);
        match &self.submit_state {
            ViewState::Ready(next) => Ok(ValidationOutcome::Submitted { next: *next }),
            ViewState::Error(err) => Err(*err),
            ViewState::Idle | ViewState::Loading => Err(ViewError::Unknown),
        }
    }
}

/// Enter `stage` and start polling for its flips in the background.
///
/// # Errors
///
/// Returns `ViewError::Unknown` if the stage cannot be entered.
pub async fn start_validation(
    validation_loop: &ValidationLoopService,
    submissions: Arc<SubmissionService>,
    stage: ValidationStage,
) -> Result<(ValidationVm, PollTask), ViewError> {
    let entry = validation_loop
        .start(stage)
        .await
        .map_err(|err| ViewError::from(&err))?;
    let task = validation_loop.spawn(entry.handle.clone());
    let vm = ValidationVm::new(entry.handle, submissions).resumed(entry.resumed);
    Ok((vm, task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flip_core::model::{FlipHash, PollSnapshot, ReadinessRecord, SnapshotEntry};
    use services::{AnswerRecord, ApiError, StageNavigator, ValidationApi};
    use std::sync::Mutex;
    use storage::repository::InMemoryRepository;

    #[derive(Default)]
    struct AcceptingApi {
        submitted: Mutex<Vec<Vec<AnswerRecord>>>,
    }

    #[async_trait]
    impl ValidationApi for AcceptingApi {
        async fn list_assigned(
            &self,
            _stage: ValidationStage,
        ) -> Result<Vec<ReadinessRecord>, ApiError> {
            Ok(Vec::new())
        }

        async fn submit_answers(
            &self,
            _stage: ValidationStage,
            answers: &[AnswerRecord],
            _nonce: u64,
            _epoch: u64,
        ) -> Result<(), ApiError> {
            self.submitted.lock().unwrap().push(answers.to_vec());
            Ok(())
        }
    }

    struct NoopNavigator;

    impl StageNavigator for NoopNavigator {
        fn go_to_next_stage(&self, _next: Option<ValidationStage>) {}
    }

    fn vm(hashes: &[(&str, bool)]) -> (ValidationVm, Arc<AcceptingApi>) {
        let handle = SessionHandle::new(ValidationStage::Short);
        let snapshot = PollSnapshot::new(
            hashes
                .iter()
                .map(|(hash, ready)| SnapshotEntry {
                    hash: FlipHash::new(*hash),
                    ready: *ready,
                    flip: None,
                })
                .collect(),
        );
        handle
            .try_replace(|session| session.merged(snapshot))
            .unwrap();
        let api = Arc::new(AcceptingApi::default());
        let submissions = Arc::new(SubmissionService::new(
            api.clone(),
            Arc::new(InMemoryRepository::new()),
            Arc::new(NoopNavigator),
        ));
        (ValidationVm::new(handle, submissions), api)
    }

    #[tokio::test]
    async fn intents_move_cursor_and_record_answers() {
        let (mut vm, _) = vm(&[("a", true), ("b", false), ("c", true)]);

        vm.dispatch(ValidationIntent::Answer(Answer::Left))
            .await
            .unwrap();
        vm.dispatch(ValidationIntent::ReportAbuse).await.unwrap();
        assert_eq!(vm.current_index(), 2);
        vm.dispatch(ValidationIntent::Next).await.unwrap();
        assert_eq!(vm.current_index(), 2);
        vm.dispatch(ValidationIntent::Pick(9)).await.unwrap();
        assert_eq!(vm.current_index(), 2);
        vm.dispatch(ValidationIntent::Prev).await.unwrap();
        assert_eq!(vm.current_index(), 1);

        assert_eq!(vm.total(), 3);
        assert_eq!(vm.readiness(), vec![true, false, true]);
        assert_eq!(
            vm.answers(),
            vec![Answer::Left, Answer::Inappropriate, Answer::Unanswered]
        );
        assert!(vm.current_flip().is_none());
        let slots = vm.slots();
        assert!(slots[1].current);
        assert!(!slots[1].ready);
    }

    #[tokio::test]
    async fn submit_before_all_answered_is_refused() {
        let (mut vm, api) = vm(&[("a", true), ("b", true)]);
        vm.dispatch(ValidationIntent::Answer(Answer::Right))
            .await
            .unwrap();

        let result = vm.dispatch(ValidationIntent::Submit).await;
        assert_eq!(result, Err(ViewError::NotReady));
        assert_eq!(vm.submit_state(), &ViewState::Error(ViewError::NotReady));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_reports_next_stage() {
        let (mut vm, api) = vm(&[("a", true), ("b", true)]);
        vm.dispatch(ValidationIntent::Answer(Answer::Right))
            .await
            .unwrap();
        vm.dispatch(ValidationIntent::Next).await.unwrap();
        vm.dispatch(ValidationIntent::Answer(Answer::Left))
            .await
            .unwrap();
        assert!(vm.can_submit());

        let outcome = vm.dispatch(ValidationIntent::Submit).await.unwrap();
        assert_eq!(
            outcome,
            ValidationOutcome::Submitted {
                next: Some(ValidationStage::Long)
            }
        );
        let submitted = api.submitted.lock().unwrap();
        let wire: Vec<u8> = submitted[0].iter().map(|record| record.answer).collect();
        assert_eq!(wire, vec![2, 1]);
    }
}
