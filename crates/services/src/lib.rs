#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod poller;
pub mod validation;

pub use flip_core::Clock;

pub use api::{AnswerRecord, FlipStore, RpcClient, ValidationApi};
pub use app_services::AppServices;
pub use config::ValidationConfig;
pub use error::{ApiError, AppServicesError, ValidationError};
pub use fetcher::FlipFetcher;
pub use poller::ReadinessPoller;
pub use validation::{
    CycleOutcome, PollTask, SessionHandle, SessionProgress, StageEntry, StageNavigator,
    SubmissionService, ValidationLoopService, build_submission,
};
