use std::sync::Arc;

use tokio::sync::watch;

/// Shared, idempotent cancellation flag for one run.
///
/// Clones observe the same flag. Cancellation is cooperative: workers check
/// [`CancelToken::is_cancelled`] between units of work and race in-flight
/// requests against [`CancelToken::cancelled`].
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Sets the flag. Returns `true` only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        self.flag.send_if_modified(|cancelled| {
            if *cancelled {
                return false;
            }
            *cancelled = true;
            true
        })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        drop(rx.wait_for(|cancelled| *cancelled).await);
    }
}
