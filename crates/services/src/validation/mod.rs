mod handle;
mod submission;
mod workflow;

// Public API of the validation subsystem.
pub use crate::error::ValidationError;
pub use handle::{SessionHandle, SessionProgress};
pub use submission::{
    SUBMISSION_EPOCH, SUBMISSION_NONCE, StageNavigator, SubmissionService, build_submission,
};
pub use workflow::{CycleOutcome, PollTask, StageEntry, ValidationLoopService};
