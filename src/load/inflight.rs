use std::sync::atomic::{AtomicU64, Ordering};

/// Counts suite executions (or ticks) in flight and remembers the peak.
#[derive(Debug, Default)]
pub(super) struct InflightCounter {
    current: AtomicU64,
    peak: AtomicU64,
}

impl InflightCounter {
    pub(super) fn peak(&self) -> u64 {
        self.peak.load(Ordering::Relaxed)
    }
}

pub(super) struct InflightGuard<'counter> {
    counter: &'counter InflightCounter,
}

impl<'counter> InflightGuard<'counter> {
    pub(super) fn acquire(counter: &'counter InflightCounter) -> Self {
        let now = counter
            .current
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1);
        counter.peak.fetch_max(now, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        loop {
            let current = self.counter.current.load(Ordering::Relaxed);
            let Some(next) = current.checked_sub(1) else {
                break;
            };
            if self
                .counter
                .current
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }
}

/// Work queue of `count` suite executions, claimed one at a time.
#[derive(Debug)]
pub(super) struct SuiteQueue {
    remaining: AtomicU64,
}

impl SuiteQueue {
    pub(super) const fn new(count: u64) -> Self {
        Self {
            remaining: AtomicU64::new(count),
        }
    }

    pub(super) fn try_claim(&self) -> bool {
        loop {
            let current = self.remaining.load(Ordering::Relaxed);
            let Some(next) = current.checked_sub(1) else {
                return false;
            };
            if self
                .remaining
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }
}
