use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flip_core::Clock;
use flip_core::model::{
    DecodedFlip, FlipHash, MergeRejected, PollSnapshot, SnapshotEntry, ValidationSession,
    ValidationStage,
};
use storage::repository::{ResumeMarker, ResumeMarkerRepository};

use super::handle::SessionHandle;
use crate::api::{FlipStore, ValidationApi};
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::{ApiError, ValidationError};
use crate::fetcher::FlipFetcher;
use crate::poller::ReadinessPoller;

/// What a single poll cycle did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The snapshot was merged into the session.
    Applied {
        total: usize,
        decoded: usize,
        fully_loaded: bool,
    },
    /// The node has not assigned any flips yet.
    NotAssigned,
    /// The snapshot conflicted with the established session and was dropped.
    Rejected(MergeRejected),
    /// The session was torn down while the cycle was in flight.
    Discarded,
}

/// A freshly entered stage.
pub struct StageEntry {
    pub handle: SessionHandle,
    /// True if a previous run left this stage unsubmitted.
    pub resumed: bool,
}

/// Background poll loop for one stage. Dropping it tears the session down.
pub struct PollTask {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollTask {
    /// Stop polling; an in-flight cycle finishes but is not applied.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the loop to exit.
    pub async fn join(mut self) {
        let join = &mut self.join;
        if let Err(err) = join.await {
            warn!(error = %err, "poll task ended abnormally");
        }
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drives flip acquisition for a stage: poll readiness, fetch, decode, merge.
#[derive(Clone)]
pub struct ValidationLoopService {
    poller: ReadinessPoller,
    fetcher: FlipFetcher,
    markers: Arc<dyn ResumeMarkerRepository>,
    clock: Clock,
    poll_interval: Duration,
}

impl ValidationLoopService {
    #[must_use]
    pub fn new(
        api: Arc<dyn ValidationApi>,
        store: Arc<dyn FlipStore>,
        markers: Arc<dyn ResumeMarkerRepository>,
        clock: Clock,
    ) -> Self {
        Self {
            poller: ReadinessPoller::new(api),
            fetcher: FlipFetcher::new(store),
            markers,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Enter `stage`: record the resume marker and create an empty session.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Storage` if the marker cannot be read or written.
    pub async fn start(&self, stage: ValidationStage) -> Result<StageEntry, ValidationError> {
        let resumed = self.markers.get_marker(stage).await?.is_some();
        if !resumed {
            self.markers
                .save_marker(&ResumeMarker::new(stage, self.clock.now()))
                .await?;
        }
        info!(%stage, resumed, "validation stage entered");
        Ok(StageEntry {
            handle: SessionHandle::new(stage),
            resumed,
        })
    }

    /// Run one poll-fetch-decode cycle and commit it unless `cancel` fired meanwhile.
    ///
    /// Only flips that report ready and have not been decoded yet are fetched.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if polling or any fetch fails at the transport level.
    pub async fn run_cycle(
        &self,
        handle: &SessionHandle,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome, ApiError> {
        let stage = handle.stage();
        let records = self.poller.poll(stage).await?;
        if records.is_empty() {
            return Ok(CycleOutcome::NotAssigned);
        }

        let current = handle.snapshot();
        let wanted: Vec<FlipHash> = records
            .iter()
            .filter(|record| record.ready && !is_decoded(&current, &record.hash))
            .map(|record| record.hash.clone())
            .collect();
        let fetched = self.fetcher.fetch_decoded(&wanted).await?;
        let mut decoded: HashMap<FlipHash, DecodedFlip> = wanted
            .into_iter()
            .zip(fetched)
            .filter_map(|(hash, flip)| flip.map(|flip| (hash, flip)))
            .collect();

        let snapshot = PollSnapshot::new(
            records
                .into_iter()
                .map(|record| SnapshotEntry {
                    flip: decoded.remove(&record.hash),
                    hash: record.hash,
                    ready: record.ready,
                })
                .collect(),
        );
        let newly_decoded = snapshot.decoded_count();

        if cancel.is_cancelled() {
            debug!(%stage, "session torn down; discarding poll cycle");
            return Ok(CycleOutcome::Discarded);
        }

        match handle.try_replace(|session| session.merged(snapshot)) {
            Ok(()) => {
                let session = handle.snapshot();
                Ok(CycleOutcome::Applied {
                    total: session.len(),
                    decoded: newly_decoded,
                    fully_loaded: session.is_fully_loaded(),
                })
            }
            Err(rejected) => {
                warn!(%stage, reason = %rejected, "ignoring inconsistent poll result");
                Ok(CycleOutcome::Rejected(rejected))
            }
        }
    }

    /// Poll immediately, then once per interval, until every flip is ready or
    /// `cancel` fires.
    pub async fn run(&self, handle: SessionHandle, cancel: CancellationToken) {
        let stage = handle.stage();
        loop {
            if cancel.is_cancelled() {
                debug!(%stage, "poll loop cancelled");
                return;
            }

            match self.run_cycle(&handle, &cancel).await {
                Ok(outcome) => debug!(%stage, ?outcome, "poll cycle finished"),
                Err(err) => warn!(%stage, error = %err, "poll cycle failed; retrying on next tick"),
            }

            if handle.snapshot().is_fully_loaded() {
                info!(%stage, flips = handle.snapshot().len(), "all flips ready; polling stopped");
                return;
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(%stage, "poll loop cancelled");
                    return;
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Spawn `run` on the current runtime.
    #[must_use]
    pub fn spawn(&self, handle: SessionHandle) -> PollTask {
        let cancel = CancellationToken::new();
        let service = self.clone();
        let token = cancel.clone();
        let join = tokio::spawn(async move { service.run(handle, token).await });
        PollTask { cancel, join }
    }
}

fn is_decoded(session: &ValidationSession, hash: &FlipHash) -> bool {
    session
        .items()
        .iter()
        .any(|item| item.hash() == hash && item.flip().is_some())
}
