use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::api::{FlipStore, RpcClient, ValidationApi};
use crate::config::ValidationConfig;
use crate::error::AppServicesError;
use crate::validation::{StageNavigator, SubmissionService, ValidationLoopService};

/// Assembles app-facing validation services.
#[derive(Clone)]
pub struct AppServices {
    validation_loop: Arc<ValidationLoopService>,
    submissions: Arc<SubmissionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the node's JSON-RPC endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: &ValidationConfig,
        clock: Clock,
        navigator: Arc<dyn StageNavigator>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let rpc = Arc::new(RpcClient::new(config)?);
        let api: Arc<dyn ValidationApi> = rpc.clone();
        let store: Arc<dyn FlipStore> = rpc;
        Ok(Self::from_parts(api, store, &storage, config, clock, navigator))
    }

    /// Wire services over already-built adapters.
    #[must_use]
    pub fn from_parts(
        api: Arc<dyn ValidationApi>,
        store: Arc<dyn FlipStore>,
        storage: &Storage,
        config: &ValidationConfig,
        clock: Clock,
        navigator: Arc<dyn StageNavigator>,
    ) -> Self {
        let validation_loop = Arc::new(
            ValidationLoopService::new(
                Arc::clone(&api),
                store,
                Arc::clone(&storage.resume_markers),
                clock,
            )
            .with_poll_interval(config.poll_interval),
        );
        let submissions = Arc::new(SubmissionService::new(
            api,
            Arc::clone(&storage.resume_markers),
            navigator,
        ));
        Self {
            validation_loop,
            submissions,
        }
    }

    #[must_use]
    pub fn validation_loop(&self) -> Arc<ValidationLoopService> {
        Arc::clone(&self.validation_loop)
    }

    #[must_use]
    pub fn submissions(&self) -> Arc<SubmissionService> {
        Arc::clone(&self.submissions)
    }
}
