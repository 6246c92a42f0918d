use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::auth::IdentityLookup;
use crate::error::{AppError, AppResult, LoadError};
use crate::metrics::TestMetrics;
use crate::store::ResultStore;

use super::cancel::CancelToken;
use super::generator::{LoadGenerator, RunSummary};
use super::types::{LoadConfig, RunStatus, TestRun};

/// Parameters of one run started through [`start_run`].
#[derive(Clone)]
pub struct RunRequest {
    pub name: String,
    pub config: LoadConfig,
    /// Populates tenant and region before the first request.
    pub identity: Option<Arc<dyn IdentityLookup>>,
    /// When set, a failed identity lookup fails the run instead of warning.
    pub identity_required: bool,
}

impl RunRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, config: LoadConfig) -> Self {
        Self {
            name: name.into(),
            config,
            identity: None,
            identity_required: false,
        }
    }

    #[must_use]
    pub fn with_identity(mut self, lookup: Arc<dyn IdentityLookup>, required: bool) -> Self {
        self.identity = Some(lookup);
        self.identity_required = required;
        self
    }
}

/// Final state of a run.
#[derive(Debug)]
pub struct RunOutcome {
    pub run: TestRun,
    pub summary: Option<RunSummary>,
    pub metrics: Option<TestMetrics>,
    /// Why the run ended `failed`.
    pub failure: Option<AppError>,
}

/// A run executing in the background.
#[derive(Debug)]
pub struct RunHandle {
    run_id: String,
    cancel: CancelToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Requests cooperative cancellation. Repeated calls, or calls after
    /// the run finished, do nothing.
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            info!("Cancellation requested for run {}", self.run_id);
        }
    }

    /// Waits for the run to reach a terminal status.
    ///
    /// # Errors
    ///
    /// Returns an error if the run task panicked or was aborted.
    pub async fn wait(self) -> AppResult<RunOutcome> {
        Ok(self.task.await?)
    }
}

/// Registers a run in `store` and drives it on a background task.
///
/// # Errors
///
/// Returns an error, without creating a run, when the suite is empty or
/// the load parameters are invalid.
pub fn start_run(
    store: &ResultStore,
    generator: LoadGenerator,
    request: RunRequest,
) -> AppResult<RunHandle> {
    if generator.specs().is_empty() {
        return Err(AppError::load(LoadError::EmptySuite));
    }
    request.config.validate()?;

    let run = store.create_run(request.name.as_str(), request.config);
    let cancel = CancelToken::new();
    let task = tokio::spawn(drive_run(
        store.clone(),
        generator,
        request,
        run.id.clone(),
        cancel.clone(),
    ));

    Ok(RunHandle {
        run_id: run.id,
        cancel,
        task,
    })
}

async fn drive_run(
    store: ResultStore,
    generator: LoadGenerator,
    request: RunRequest,
    run_id: String,
    cancel: CancelToken,
) -> RunOutcome {
    let (status, summary, failure) = match execute_run(&store, generator, &request, &run_id, &cancel).await
    {
        Ok(summary) => {
            let status = if summary.cancelled {
                RunStatus::Stopped
            } else {
                RunStatus::Completed
            };
            (status, Some(summary), None)
        }
        Err(err) => {
            error!("Run {} failed: {}", run_id, err);
            (RunStatus::Failed, None, Some(err))
        }
    };

    let run = match store.finish_run(&run_id, status) {
        Ok(run) => run,
        Err(err) => {
            warn!("{}", err);
            let mut run = TestRun::new(request.name.as_str(), request.config);
            run.id = run_id.clone();
            run.finish(status);
            run
        }
    };

    RunOutcome {
        run,
        summary,
        metrics: store.metrics(&run_id),
        failure,
    }
}

async fn execute_run(
    store: &ResultStore,
    generator: LoadGenerator,
    request: &RunRequest,
    run_id: &str,
    cancel: &CancelToken,
) -> AppResult<RunSummary> {
    let mut auth = generator.auth().clone();
    if let Some(lookup) = request.identity.as_ref() {
        auth.populate_identity(lookup.as_ref(), request.identity_required)
            .await?;
    }

    let generator = generator.with_auth(auth);
    generator
        .run(&request.config, Arc::new(store.sink(run_id)), cancel)
        .await
}
