//! Result Store: keyed runs, their results and metrics, plus change
//! notifications for whoever renders or persists them.
mod events;


use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, LoadError};
use crate::load::{LoadConfig, ResultSink, RunStatus, TestRun};
use crate::metrics::{MetricsAggregator, RequestResult, TestMetrics, now_ms};

pub use events::StoreEvent;

/// Subscriber queue depth; slow subscribers observe `Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

struct RunEntry {
    run: TestRun,
    results: Vec<RequestResult>,
    aggregator: MetricsAggregator,
    metrics: Option<TestMetrics>,
}

#[derive(Default)]
struct StoreState {
    runs: HashMap<String, RunEntry>,
    order: Vec<String>,
}

/// Cheaply cloneable handle; clones share the same runs.
#[derive(Clone)]
pub struct ResultStore {
    state: Arc<Mutex<StoreState>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("runs", &self.state().order.len())
            .finish()
    }
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            events,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Registers a new run in `running` state.
    #[must_use]
    pub fn create_run(&self, name: impl Into<String>, config: LoadConfig) -> TestRun {
        let run = TestRun::new(name, config);
        {
            let mut state = self.state();
            state.order.push(run.id.clone());
            state.runs.insert(
                run.id.clone(),
                RunEntry {
                    run: run.clone(),
                    results: Vec::new(),
                    aggregator: MetricsAggregator::new(),
                    metrics: None,
                },
            );
        }
        info!("Run '{}' ({}) started", run.name, run.id);
        self.publish(StoreEvent::RunStarted(run.clone()));
        run
    }

    /// Moves a run out of `running`. Calls on a finished run change
    /// nothing and return the run as it is.
    ///
    /// # Errors
    ///
    /// Returns an error when `run_id` is unknown.
    pub fn finish_run(&self, run_id: &str, status: RunStatus) -> AppResult<TestRun> {
        let (run, changed) = {
            let mut state = self.state();
            let entry = state
                .runs
                .get_mut(run_id)
                .ok_or_else(|| unknown_run(run_id))?;
            let changed = entry.run.finish(status);
            (entry.run.clone(), changed)
        };
        if changed {
            info!("Run '{}' ({}) {}", run.name, run.id, run.status.as_str());
            self.publish(StoreEvent::RunFinished(run.clone()));
        } else {
            debug!(
                "Ignoring {} for run {} already {}",
                status.as_str(),
                run.id,
                run.status.as_str()
            );
        }
        Ok(run)
    }

    /// Appends a result and refreshes the run's metrics.
    ///
    /// # Errors
    ///
    /// Returns an error when `run_id` is unknown.
    pub fn record(&self, run_id: &str, result: RequestResult) -> AppResult<Option<TestMetrics>> {
        let metrics = {
            let mut state = self.state();
            let entry = state
                .runs
                .get_mut(run_id)
                .ok_or_else(|| unknown_run(run_id))?;
            entry.metrics = entry.aggregator.on_result(&result, now_ms());
            entry.results.push(result.clone());
            entry.metrics.clone()
        };
        self.publish(StoreEvent::ResultRecorded {
            run_id: run_id.to_owned(),
            result,
            metrics: metrics.clone(),
        });
        Ok(metrics)
    }

    #[must_use]
    pub fn run(&self, run_id: &str) -> Option<TestRun> {
        self.state().runs.get(run_id).map(|entry| entry.run.clone())
    }

    /// All runs in creation order.
    #[must_use]
    pub fn runs(&self) -> Vec<TestRun> {
        let state = self.state();
        state
            .order
            .iter()
            .filter_map(|id| state.runs.get(id))
            .map(|entry| entry.run.clone())
            .collect()
    }

    #[must_use]
    pub fn results(&self, run_id: &str) -> Option<Vec<RequestResult>> {
        self.state()
            .runs
            .get(run_id)
            .map(|entry| entry.results.clone())
    }

    /// Metrics as of the last recorded result; `None` before the first.
    #[must_use]
    pub fn metrics(&self, run_id: &str) -> Option<TestMetrics> {
        self.state()
            .runs
            .get(run_id)
            .and_then(|entry| entry.metrics.clone())
    }

    /// Sink that records into `run_id`.
    #[must_use]
    pub fn sink(&self, run_id: impl Into<String>) -> RunRecorder {
        RunRecorder {
            store: self.clone(),
            run_id: run_id.into(),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: StoreEvent) {
        // no subscribers is fine
        drop(self.events.send(event));
    }
}

fn unknown_run(run_id: &str) -> AppError {
    AppError::load(LoadError::UnknownRun {
        id: run_id.to_owned(),
    })
}

/// [`ResultSink`] bound to one run of a [`ResultStore`].
#[derive(Debug, Clone)]
pub struct RunRecorder {
    store: ResultStore,
    run_id: String,
}

impl ResultSink for RunRecorder {
    fn record(&self, result: RequestResult) {
        if let Err(err) = self.store.record(&self.run_id, result) {
            warn!("Dropping result: {}", err);
        }
    }
}
