use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{AuthContext, HttpIdentityLookup};
use crate::error::{AppError, AppResult, LoadError};
use crate::http::{RequestExecutor, build_client};
use crate::load::{CancelToken, LoadConfig, LoadGenerator, RunRequest, start_run};
use crate::metrics::TestMetrics;
use crate::store::{ResultStore, StoreEvent};
use crate::system::cancel_on_shutdown_signal;
use crate::system::summary_output::{metrics_lines, run_status_line, validation_lines};
use crate::validation::suggest_rules;

use super::types::{RunPlan, SuitePlan};

/// Interval between progress log lines during a load run.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

pub(crate) async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::Load { suite, config } => run_load(suite, config).await,
        RunPlan::Single(suite) => run_single(&suite).await,
        RunPlan::Suggest(suite) => run_suggest(&suite).await,
    }
}

async fn run_load(plan: SuitePlan, config: LoadConfig) -> AppResult<()> {
    let client = build_client(plan.settings.timeout)?;
    let executor = RequestExecutor::new(client.clone(), &plan.settings);
    let mut request = RunRequest::new(plan.name.as_str(), config);
    if let Some(url) = plan.identity_url {
        request = request.with_identity(
            Arc::new(HttpIdentityLookup::new(client, url)),
            plan.identity_required,
        );
    }
    let generator = LoadGenerator::new(executor, plan.specs, plan.auth);

    let store = ResultStore::new();
    let progress = spawn_progress(store.subscribe());
    let handle = start_run(&store, generator, request)?;
    info!("Started {} run {}", config.kind().as_str(), handle.run_id());

    let cancel = handle.cancel_token();
    let signals = cancel_on_shutdown_signal(&cancel);
    let outcome = handle.wait().await;

    cancel.cancel();
    if let Err(err) = signals.await {
        warn!("Signal handler task failed: {}", err);
    }
    drop(store);
    if let Err(err) = progress.await {
        warn!("Progress task failed: {}", err);
    }

    let outcome = outcome?;
    println!("{}", run_status_line(&outcome.run, outcome.summary.as_ref()));
    if let Some(metrics) = outcome.metrics.as_ref() {
        for line in metrics_lines(metrics) {
            println!("{}", line);
        }
    }
    match outcome.failure {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}

/// Logs the latest metrics every [`PROGRESS_INTERVAL`] until the run
/// finishes or the store goes away.
fn spawn_progress(mut events: broadcast::Receiver<StoreEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut latest: Option<TestMetrics> = None;
        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        ticker.tick().await;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(StoreEvent::ResultRecorded { metrics, .. }) => {
                        if metrics.is_some() {
                            latest = metrics;
                        }
                    }
                    Ok(StoreEvent::RunStarted(_)) => {}
                    Ok(StoreEvent::RunFinished(_)) | Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Progress reporter skipped {} events", skipped);
                    }
                },
                _ = ticker.tick() => {
                    if let Some(metrics) = latest.as_ref() {
                        info!(
                            "{} requests ({} failed), p95 {}ms, {} req/s",
                            metrics.total_requests,
                            metrics.failed_requests,
                            metrics.p95,
                            metrics.current_rps
                        );
                    }
                }
            }
        }
    })
}

async fn run_single(plan: &SuitePlan) -> AppResult<()> {
    let (executor, auth) = prepare(plan).await?;
    let cancel = CancelToken::new();
    let signals = cancel_on_shutdown_signal(&cancel);

    let mut failed = 0usize;
    for spec in &plan.specs {
        if cancel.is_cancelled() {
            break;
        }
        let detail = executor.execute_detailed(spec, &auth, &cancel).await;
        if !detail.result.success {
            failed = failed.saturating_add(1);
        }
        for line in validation_lines(&detail) {
            println!("{}", line);
        }
    }

    cancel.cancel();
    if let Err(err) = signals.await {
        warn!("Signal handler task failed: {}", err);
    }

    if failed > 0 {
        return Err(AppError::load(LoadError::RequestsFailed {
            failed,
            total: plan.specs.len(),
        }));
    }
    Ok(())
}

async fn run_suggest(plan: &SuitePlan) -> AppResult<()> {
    let (executor, auth) = prepare(plan).await?;
    let spec = plan
        .specs
        .first()
        .ok_or_else(|| AppError::load(LoadError::EmptySuite))?;

    let detail = executor
        .execute_detailed(spec, &auth, &CancelToken::new())
        .await;
    let Some(snapshot) = detail.snapshot.as_ref() else {
        return Err(AppError::load(LoadError::NoResponse {
            name: spec.name.clone(),
            message: detail.result.error_kind().to_owned(),
        }));
    };
    if !detail.result.success {
        warn!(
            "Sample response for '{}' was not successful: {}",
            spec.name,
            detail.result.error_kind()
        );
    }

    println!("{}", serde_json::to_string_pretty(&suggest_rules(snapshot))?);
    Ok(())
}

/// Builds the executor and resolves identity once, for runs that do not
/// go through the load runner.
async fn prepare(plan: &SuitePlan) -> AppResult<(RequestExecutor, AuthContext)> {
    let client = build_client(plan.settings.timeout)?;
    let mut auth = plan.auth.clone();
    if let Some(url) = plan.identity_url.as_ref() {
        let lookup = HttpIdentityLookup::new(client.clone(), url.clone());
        auth.populate_identity(&lookup, plan.identity_required).await?;
    }
    Ok((RequestExecutor::new(client, &plan.settings), auth))
}
