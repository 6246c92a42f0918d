use super::*;
use crate::args::HttpMethod;
use crate::auth::{AuthContext, Identity, IdentityLookup};
use crate::error::{AppError, AppResult, HttpError, LoadError};
use crate::http::{ClientSettings, RequestExecutor, RequestSpec, build_client};
use crate::metrics::RequestResult;
use crate::store::ResultStore;
use async_trait::async_trait;
use std::future::Future;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

/// Base URL of a port nothing listens on, so requests fail fast.
fn closed_base_url() -> Result<reqwest::Url, String> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("addr failed: {}", err))?;
    drop(listener);
    reqwest::Url::parse(&format!("http://{}", addr)).map_err(|err| err.to_string())
}

fn generator(spec_names: &[&str]) -> Result<LoadGenerator, String> {
    let settings = ClientSettings {
        base_url: Some(closed_base_url()?),
        timeout: Duration::from_secs(2),
        ..ClientSettings::default()
    };
    let client = build_client(settings.timeout).map_err(|err| err.to_string())?;
    let specs = spec_names
        .iter()
        .map(|name| RequestSpec::new(*name, HttpMethod::Get, format!("/{}", name)))
        .collect();
    Ok(LoadGenerator::new(
        RequestExecutor::new(client, &settings),
        specs,
        AuthContext::default(),
    ))
}

type Collected = Arc<Mutex<Vec<RequestResult>>>;

fn collecting_sink() -> (Arc<dyn ResultSink>, Collected) {
    let collected: Collected = Arc::new(Mutex::new(Vec::new()));
    let target = Arc::clone(&collected);
    let sink = move |result: RequestResult| {
        if let Ok(mut results) = target.lock() {
            results.push(result);
        }
    };
    (Arc::new(sink), collected)
}

fn collected_len(collected: &Collected) -> Result<usize, String> {
    collected
        .lock()
        .map(|results| results.len())
        .map_err(|err| format!("lock poisoned: {}", err))
}

fn is_load_error(err: &AppError, expected: &LoadError) -> bool {
    matches!(err, AppError::Load(actual) if std::mem::discriminant(actual) == std::mem::discriminant(expected))
}

struct FailingLookup;

#[async_trait]
impl IdentityLookup for FailingLookup {
    async fn lookup(&self) -> AppResult<Identity> {
        Err(AppError::http(HttpError::IdentityStatus { status: 500 }))
    }
}

#[test]
fn zero_rate_is_rejected_before_any_request() -> Result<(), String> {
    run_async_test(async {
        let generator = generator(&["a"])?;
        let (sink, collected) = collecting_sink();
        for (duration, rate, expected) in [
            (1.0, 0.0, LoadError::InvalidRate),
            (1.0, -2.0, LoadError::InvalidRate),
            (1.0, f64::NAN, LoadError::InvalidRate),
            (1.0, 1e12, LoadError::InvalidRate),
            (0.0, 5.0, LoadError::InvalidDuration),
        ] {
            match generator
                .run_timed(duration, rate, Arc::clone(&sink), &CancelToken::new())
                .await
            {
                Ok(summary) => return Err(format!("Expected rejection, got {:?}", summary)),
                Err(err) if is_load_error(&err, &expected) => {}
                Err(err) => return Err(format!("Unexpected error: {}", err)),
            }
        }
        if collected_len(&collected)? != 0 {
            return Err("No request may be issued for rejected parameters".to_owned());
        }
        Ok(())
    })
}

#[test]
fn fixed_mode_rejects_zero_count_and_empty_suite() -> Result<(), String> {
    run_async_test(async {
        let (sink, _) = collecting_sink();
        let cancel = CancelToken::new();
        let zero = generator(&["a"])?
            .run_fixed(0, 2, Arc::clone(&sink), &cancel)
            .await;
        if !matches!(&zero, Err(err) if is_load_error(err, &LoadError::InvalidCount)) {
            return Err(format!("Expected InvalidCount, got {:?}", zero));
        }
        let empty = generator(&[])?.run_fixed(1, 1, sink, &cancel).await;
        if !matches!(&empty, Err(err) if is_load_error(err, &LoadError::EmptySuite)) {
            return Err(format!("Expected EmptySuite, got {:?}", empty));
        }
        Ok(())
    })
}

#[test]
fn fixed_mode_reports_every_request_once() -> Result<(), String> {
    run_async_test(async {
        let generator = generator(&["first", "second"])?;
        let (sink, collected) = collecting_sink();
        let summary = tokio::time::timeout(
            TEST_TIMEOUT,
            generator.run_fixed(5, 3, sink, &CancelToken::new()),
        )
        .await
        .map_err(|err| format!("run timed out: {}", err))?
        .map_err(|err| err.to_string())?;

        if summary.requests != 10 || summary.iterations != 5 || summary.cancelled {
            return Err(format!("Unexpected summary: {:?}", summary));
        }
        if summary.peak_in_flight == 0 || summary.peak_in_flight > 3 {
            return Err(format!("Peak in flight out of bounds: {:?}", summary));
        }
        let results = collected
            .lock()
            .map_err(|err| format!("lock poisoned: {}", err))?;
        if results.len() != 10 {
            return Err(format!("Expected 10 results, got {}", results.len()));
        }
        if results
            .iter()
            .any(|result| result.success || result.status_code.is_some() || result.error.is_none())
        {
            return Err("Refused connections must be transport failures".to_owned());
        }
        let firsts = results.iter().filter(|result| result.config_name == "first").count();
        if firsts != 5 {
            return Err(format!("Expected each spec 5 times, got {}", firsts));
        }
        Ok(())
    })
}

#[test]
fn pre_cancelled_fixed_run_sends_nothing() -> Result<(), String> {
    run_async_test(async {
        let cancel = CancelToken::new();
        cancel.cancel();
        let (sink, collected) = collecting_sink();
        let summary = generator(&["a"])?
            .run_fixed(100, 4, sink, &cancel)
            .await
            .map_err(|err| err.to_string())?;
        if !summary.cancelled || summary.requests != 0 || collected_len(&collected)? != 0 {
            return Err(format!("Unexpected summary: {:?}", summary));
        }
        Ok(())
    })
}

#[test]
fn timed_run_stops_on_cancel() -> Result<(), String> {
    run_async_test(async {
        let generator = generator(&["a", "b"])?;
        let (sink, collected) = collecting_sink();
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            trigger.cancel();
        });
        let summary = tokio::time::timeout(
            TEST_TIMEOUT,
            generator.run_timed(10.0, 40.0, sink, &cancel),
        )
        .await
        .map_err(|err| format!("cancel was not observed: {}", err))?
        .map_err(|err| err.to_string())?;
        if !summary.cancelled || summary.iterations == 0 {
            return Err(format!("Unexpected summary: {:?}", summary));
        }
        if u64::try_from(collected_len(&collected)?).unwrap_or(u64::MAX) != summary.iterations {
            return Err("Every fired tick must be reported after the drain".to_owned());
        }
        Ok(())
    })
}

#[test]
fn cancel_token_is_idempotent() -> Result<(), String> {
    run_async_test(async {
        let cancel = CancelToken::new();
        let clone = cancel.clone();
        if cancel.is_cancelled() {
            return Err("Fresh token must not be cancelled".to_owned());
        }
        if !clone.cancel() || cancel.cancel() {
            return Err("Only the first cancel flips the flag".to_owned());
        }
        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .map_err(|err| format!("cancelled() did not resolve: {}", err))?;
        if !cancel.is_cancelled() {
            return Err("Flag must stay set".to_owned());
        }
        Ok(())
    })
}

#[test]
fn run_leaves_running_exactly_once() -> Result<(), String> {
    let mut run = TestRun::new(
        "r",
        LoadConfig::Fixed {
            count: 1,
            concurrency: 1,
        },
    );
    if run.status != RunStatus::Running || run.end_time_ms.is_some() {
        return Err(format!("Unexpected new run: {:?}", run));
    }
    if run.finish(RunStatus::Running) {
        return Err("Running is not a terminal status".to_owned());
    }
    if !run.finish(RunStatus::Completed) || run.end_time_ms.is_none() {
        return Err(format!("Expected completion: {:?}", run));
    }
    if run.finish(RunStatus::Stopped) || run.status != RunStatus::Completed {
        return Err(format!("Terminal status must not change: {:?}", run));
    }
    Ok(())
}

#[test]
fn load_config_reads_mode_tag() -> Result<(), String> {
    let config: LoadConfig =
        serde_json::from_str(r#"{"mode":"timed","duration_minutes":0.5,"rate_per_second":4}"#)
            .map_err(|err| err.to_string())?;
    if config.kind() != RunKind::Timed || config.validate().is_err() {
        return Err(format!("Unexpected config: {:?}", config));
    }
    Ok(())
}

#[test]
fn cancelling_after_completion_keeps_status() -> Result<(), String> {
    run_async_test(async {
        let store = ResultStore::new();
        let handle = start_run(
            &store,
            generator(&["a"])?,
            RunRequest::new(
                "done",
                LoadConfig::Fixed {
                    count: 2,
                    concurrency: 1,
                },
            ),
        )
        .map_err(|err| err.to_string())?;
        let run_id = handle.run_id().to_owned();
        let token = handle.cancel_token();
        let outcome = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
            .await
            .map_err(|err| format!("run timed out: {}", err))?
            .map_err(|err| err.to_string())?;
        if outcome.run.status != RunStatus::Completed {
            return Err(format!("Expected completed, got {:?}", outcome.run));
        }

        token.cancel();
        token.cancel();
        let finished = store
            .finish_run(&run_id, RunStatus::Stopped)
            .map_err(|err| err.to_string())?;
        if finished.status != RunStatus::Completed || finished.end_time_ms != outcome.run.end_time_ms {
            return Err(format!("Terminal status changed: {:?}", finished));
        }
        let metrics = store.metrics(&run_id).ok_or("missing metrics")?;
        if metrics.total_requests != 2 || metrics.failed_requests != 2 {
            return Err(format!("Unexpected metrics: {:?}", metrics));
        }
        Ok(())
    })
}

#[test]
fn invalid_parameters_do_not_create_a_run() -> Result<(), String> {
    run_async_test(async {
        let store = ResultStore::new();
        for rate_per_second in [0.0, 1e12] {
            let result = start_run(
                &store,
                generator(&["a"])?,
                RunRequest::new(
                    "bad",
                    LoadConfig::Timed {
                        duration_minutes: 1.0,
                        rate_per_second,
                    },
                ),
            );
            match result {
                Err(err) if is_load_error(&err, &LoadError::InvalidRate) => {}
                Err(err) => return Err(format!("Unexpected error for {}: {}", rate_per_second, err)),
                Ok(_) => return Err(format!("Rate {} must be rejected", rate_per_second)),
            }
        }
        if !store.runs().is_empty() {
            return Err("Invalid rates must be rejected before the run exists".to_owned());
        }
        Ok(())
    })
}

#[test]
fn sub_nanosecond_tick_period_fails_validation() -> Result<(), String> {
    let too_fast = LoadConfig::Timed {
        duration_minutes: 1.0,
        rate_per_second: 5e9,
    };
    if !matches!(too_fast.validate(), Err(err) if is_load_error(&err, &LoadError::InvalidRate)) {
        return Err("Expected a zero tick period to be an invalid rate".to_owned());
    }
    let fast = LoadConfig::Timed {
        duration_minutes: 1.0,
        rate_per_second: 1e6,
    };
    fast.validate().map_err(|err| err.to_string())?;
    let endless = LoadConfig::Timed {
        duration_minutes: 1e300,
        rate_per_second: 1.0,
    };
    if !matches!(endless.validate(), Err(err) if is_load_error(&err, &LoadError::InvalidDuration)) {
        return Err("Expected an unrepresentable duration to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn required_identity_failure_fails_the_run() -> Result<(), String> {
    run_async_test(async {
        let store = ResultStore::new();
        let config = LoadConfig::Fixed {
            count: 1,
            concurrency: 1,
        };
        let required = start_run(
            &store,
            generator(&["a"])?,
            RunRequest::new("required", config).with_identity(Arc::new(FailingLookup), true),
        )
        .map_err(|err| err.to_string())?
        .wait()
        .await
        .map_err(|err| err.to_string())?;
        if required.run.status != RunStatus::Failed || required.failure.is_none() {
            return Err(format!("Expected failed run: {:?}", required.run));
        }
        if store.results(&required.run.id).is_some_and(|results| !results.is_empty()) {
            return Err("A failed setup must not issue requests".to_owned());
        }

        let optional = start_run(
            &store,
            generator(&["a"])?,
            RunRequest::new("optional", config).with_identity(Arc::new(FailingLookup), false),
        )
        .map_err(|err| err.to_string())?
        .wait()
        .await
        .map_err(|err| err.to_string())?;
        if optional.run.status != RunStatus::Completed {
            return Err(format!("Optional lookup must only warn: {:?}", optional.run));
        }
        Ok(())
    })
}
