use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{Instant, interval, sleep_until};
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::error::{AppError, AppResult, LoadError};
use crate::http::{RequestExecutor, RequestSpec};

use super::cancel::CancelToken;
use super::inflight::{InflightCounter, InflightGuard, SuiteQueue};
use super::sink::ResultSink;
use super::types::{LoadConfig, run_length, tick_period};

/// What a finished load pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Results handed to the sink.
    pub requests: u64,
    /// Suite executions (fixed) or ticks (timed) started.
    pub iterations: u64,
    /// Highest number of suite executions or ticks in flight at once.
    pub peak_in_flight: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Drives a [`RequestExecutor`] over a suite of specs.
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    executor: RequestExecutor,
    specs: Arc<[RequestSpec]>,
    auth: Arc<AuthContext>,
}

struct RunContext {
    executor: RequestExecutor,
    specs: Arc<[RequestSpec]>,
    auth: Arc<AuthContext>,
    sink: Arc<dyn ResultSink>,
    cancel: CancelToken,
    in_flight: InflightCounter,
    reported: AtomicU64,
}

impl RunContext {
    async fn execute_and_report(&self, spec: &RequestSpec) {
        let result = self.executor.execute(spec, &self.auth, &self.cancel).await;
        self.sink.record(result);
        self.reported.fetch_add(1, Ordering::Relaxed);
    }
}

impl LoadGenerator {
    #[must_use]
    pub fn new(executor: RequestExecutor, specs: Vec<RequestSpec>, auth: AuthContext) -> Self {
        Self {
            executor,
            specs: specs.into(),
            auth: Arc::new(auth),
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    #[must_use]
    pub fn specs(&self) -> &[RequestSpec] {
        &self.specs
    }

    #[must_use]
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    #[must_use]
    pub const fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Runs `config` to completion or cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error, before any request is issued, when the suite is
    /// empty or the load parameters are invalid.
    pub async fn run(
        &self,
        config: &LoadConfig,
        sink: Arc<dyn ResultSink>,
        cancel: &CancelToken,
    ) -> AppResult<RunSummary> {
        match *config {
            LoadConfig::Fixed { count, concurrency } => {
                self.run_fixed(count, concurrency, sink, cancel).await
            }
            LoadConfig::Timed {
                duration_minutes,
                rate_per_second,
            } => {
                self.run_timed(duration_minutes, rate_per_second, sink, cancel)
                    .await
            }
        }
    }

    /// Runs `count` suite executions on a pool of `concurrency` workers.
    ///
    /// Each worker claims one suite execution at a time and runs every spec
    /// in order, checking `cancel` before each spec.
    ///
    /// # Errors
    ///
    /// Returns an error when the suite is empty or `count`/`concurrency`
    /// is zero.
    pub async fn run_fixed(
        &self,
        count: u64,
        concurrency: usize,
        sink: Arc<dyn ResultSink>,
        cancel: &CancelToken,
    ) -> AppResult<RunSummary> {
        self.ensure_specs()?;
        LoadConfig::Fixed { count, concurrency }.validate()?;

        let started = Instant::now();
        let context = self.context(sink, cancel);
        let queue = Arc::new(SuiteQueue::new(count));
        let claimed = Arc::new(AtomicU64::new(0));
        let workers = usize::try_from(count).map_or(concurrency, |count| count.min(concurrency));
        info!(
            "Starting fixed run: {} suite executions x {} specs, {} workers",
            count,
            self.specs.len(),
            workers
        );

        let mut tasks = JoinSet::new();
        for _ in 0..workers {
            let context = Arc::clone(&context);
            let queue = Arc::clone(&queue);
            let claimed = Arc::clone(&claimed);
            tasks.spawn(async move {
                loop {
                    if context.cancel.is_cancelled() || !queue.try_claim() {
                        break;
                    }
                    claimed.fetch_add(1, Ordering::Relaxed);
                    let _in_flight = InflightGuard::acquire(&context.in_flight);
                    for spec in context.specs.iter() {
                        if context.cancel.is_cancelled() {
                            break;
                        }
                        context.execute_and_report(spec).await;
                    }
                }
            });
        }
        join_all(&mut tasks).await;

        Ok(summary(
            &context,
            claimed.load(Ordering::Relaxed),
            started.elapsed(),
        ))
    }

    /// Fires one request every `1 / rate_per_second` seconds, cycling
    /// through the specs, until the duration elapses or `cancel` fires.
    ///
    /// Ticks do not wait for each other. Requests still in flight when
    /// scheduling stops are awaited before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error when the suite is empty or the rate or duration is
    /// not a positive finite number. Nothing is sent in that case.
    pub async fn run_timed(
        &self,
        duration_minutes: f64,
        rate_per_second: f64,
        sink: Arc<dyn ResultSink>,
        cancel: &CancelToken,
    ) -> AppResult<RunSummary> {
        self.ensure_specs()?;
        LoadConfig::Timed {
            duration_minutes,
            rate_per_second,
        }
        .validate()?;
        let period = tick_period(rate_per_second)?;
        let duration = run_length(duration_minutes)?;

        let started = Instant::now();
        let deadline = started
            .checked_add(duration)
            .ok_or_else(|| AppError::load(LoadError::InvalidDuration))?;
        let context = self.context(sink, cancel);
        let spec_count = self.specs.len();
        info!(
            "Starting timed run: {:.3} req/s for {:.3} minutes over {} specs",
            rate_per_second, duration_minutes, spec_count
        );

        let mut ticker = interval(period);
        let mut tasks = JoinSet::new();
        let mut fired: u64 = 0;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = sleep_until(deadline) => break,
                _ = ticker.tick() => {}
            }
            if cancel.is_cancelled() || Instant::now() >= deadline {
                break;
            }

            let index = usize::try_from(fired).unwrap_or(usize::MAX) % spec_count;
            let context = Arc::clone(&context);
            tasks.spawn(async move {
                let _in_flight = InflightGuard::acquire(&context.in_flight);
                if let Some(spec) = context.specs.get(index) {
                    context.execute_and_report(spec).await;
                }
            });
            fired = fired.saturating_add(1);

            while let Some(joined) = tasks.try_join_next() {
                if let Err(err) = joined {
                    warn!("Tick task failed: {}", err);
                }
            }
        }
        debug!("Timed run stopped scheduling after {} ticks", fired);
        join_all(&mut tasks).await;

        Ok(summary(&context, fired, started.elapsed()))
    }

    fn ensure_specs(&self) -> AppResult<()> {
        if self.specs.is_empty() {
            return Err(AppError::load(LoadError::EmptySuite));
        }
        Ok(())
    }

    fn context(&self, sink: Arc<dyn ResultSink>, cancel: &CancelToken) -> Arc<RunContext> {
        Arc::new(RunContext {
            executor: self.executor.clone(),
            specs: Arc::clone(&self.specs),
            auth: Arc::clone(&self.auth),
            sink,
            cancel: cancel.clone(),
            in_flight: InflightCounter::default(),
            reported: AtomicU64::new(0),
        })
    }
}

async fn join_all(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!("Load task failed: {}", err);
        }
    }
}

fn summary(context: &RunContext, iterations: u64, elapsed: Duration) -> RunSummary {
    RunSummary {
        requests: context.reported.load(Ordering::Relaxed),
        iterations,
        peak_in_flight: context.in_flight.peak(),
        cancelled: context.cancel.is_cancelled(),
        elapsed,
    }
}
