use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::load::CancelToken;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Cancels `token` on Ctrl-C or SIGTERM. The task ends on its own once
/// the token is cancelled by anyone else.
#[must_use]
pub fn cancel_on_shutdown_signal(token: &CancelToken) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        let terminated = async {
            if let Some(signal) = term_signal.as_mut() {
                signal.recv().await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        tokio::select! {
            () = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!("Failed to listen for Ctrl-C: {}", err);
                    return;
                }
                if token.cancel() {
                    info!("Interrupted; stopping run");
                }
            }
            () = terminated => {
                if token.cancel() {
                    info!("Terminated; stopping run");
                }
            }
        }
    })
}
