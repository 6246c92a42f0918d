use crate::load::TestRun;
use crate::metrics::{RequestResult, TestMetrics};

/// Change notifications published by the store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    RunStarted(TestRun),
    ResultRecorded {
        run_id: String,
        result: RequestResult,
        metrics: Option<TestMetrics>,
    },
    RunFinished(TestRun),
}

impl StoreEvent {
    #[must_use]
    pub fn run_id(&self) -> &str {
        match self {
            StoreEvent::RunStarted(run) | StoreEvent::RunFinished(run) => &run.id,
            StoreEvent::ResultRecorded { run_id, .. } => run_id,
        }
    }
}
