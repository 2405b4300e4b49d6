use std::sync::Arc;

use tokio::sync::watch;

use flip_core::model::{Answer, ValidationSession, ValidationStage};

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub current: usize,
    pub fully_loaded: bool,
    pub can_submit: bool,
}

/// Shared owner of a stage's `ValidationSession`.
///
/// Every write swaps in a whole new session value, so readers always see a state
/// produced by one complete poll cycle or one complete user action.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Arc<ValidationSession>>>,
}

impl SessionHandle {
    #[must_use]
    pub fn new(stage: ValidationStage) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(ValidationSession::new(stage)));
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn stage(&self) -> ValidationStage {
        self.tx.borrow().stage()
    }

    /// The latest committed session.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ValidationSession> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver that is notified after every commit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<ValidationSession>> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let session = self.snapshot();
        SessionProgress {
            total: session.len(),
            answered: session.answered_count(),
            current: session.current_index(),
            fully_loaded: session.is_fully_loaded(),
            can_submit: session.can_submit(),
        }
    }

    /// Replace the session with the result of `build`, unless it fails.
    ///
    /// # Errors
    ///
    /// Returns whatever `build` returned; the session is left untouched.
    pub fn try_replace<E>(
        &self,
        build: impl FnOnce(&ValidationSession) -> Result<ValidationSession, E>,
    ) -> Result<(), E> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|current| match build(current) {
            Ok(next) => {
                *current = Arc::new(next);
                true
            }
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        outcome
    }

    fn apply(&self, action: impl FnOnce(&mut ValidationSession)) {
        self.tx.send_modify(|current| {
            let mut next = ValidationSession::clone(current);
            action(&mut next);
            *current = Arc::new(next);
        });
    }

    pub fn prev(&self) {
        self.apply(ValidationSession::prev);
    }

    pub fn next(&self) {
        self.apply(ValidationSession::next);
    }

    pub fn pick(&self, position: usize) {
        self.apply(|session| session.pick(position));
    }

    pub fn answer(&self, answer: Answer) {
        self.apply(|session| session.answer(answer));
    }

    pub fn report_inappropriate(&self) {
        self.apply(ValidationSession::report_inappropriate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flip_core::model::{FlipHash, MergeRejected, PollSnapshot, SnapshotEntry};

    fn populate(handle: &SessionHandle, hashes: &[&str]) {
        let snapshot = PollSnapshot::new(
            hashes
                .iter()
                .map(|hash| SnapshotEntry {
                    hash: FlipHash::new(*hash),
                    ready: true,
                    flip: None,
                })
                .collect(),
        );
        handle
            .try_replace(|session| session.merged(snapshot))
            .unwrap();
    }

    #[test]
    fn old_snapshots_are_unaffected_by_later_writes() {
        let handle = SessionHandle::new(ValidationStage::Short);
        populate(&handle, &["a", "b"]);
        let before = handle.snapshot();

        handle.answer(Answer::Left);
        handle.next();

        assert_eq!(before.answers(), vec![Answer::Unanswered; 2]);
        assert_eq!(before.current_index(), 0);
        let after = handle.snapshot();
        assert_eq!(after.answers()[0], Answer::Left);
        assert_eq!(after.current_index(), 1);
    }

    #[test]
    fn failed_replace_keeps_state_and_does_not_notify() {
        let handle = SessionHandle::new(ValidationStage::Short);
        populate(&handle, &["a", "b"]);
        let rx = handle.subscribe();

        let result = handle.try_replace(|session| session.merged(PollSnapshot::default()));
        assert_eq!(result, Err(MergeRejected::Empty));
        assert_eq!(handle.snapshot().len(), 2);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn progress_tracks_answers() {
        let handle = SessionHandle::new(ValidationStage::Short);
        populate(&handle, &["a", "b"]);
        handle.answer(Answer::Right);
        handle.next();
        handle.report_inappropriate();

        let progress = handle.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.current, 1);
        assert!(progress.fully_loaded);
        assert!(progress.can_submit);
    }
}
