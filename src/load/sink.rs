use crate::metrics::RequestResult;

/// Receives every completed request exactly once, from any worker.
pub trait ResultSink: Send + Sync {
    fn record(&self, result: RequestResult);
}

impl<F> ResultSink for F
where
    F: Fn(RequestResult) + Send + Sync,
{
    fn record(&self, result: RequestResult) {
        self(result);
    }
}
