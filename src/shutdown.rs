use tokio::signal::unix::{signal, SignalKind};

use crate::state::StopFlag;

/// Install a shutdown handler that listens for SIGTERM and SIGINT.
///
/// Either signal raises `stop`, so the TAs finish their current iteration and
/// exit through the normal path. The handler task ends on its own once the
/// flag is raised for any other reason.
pub fn install_shutdown_handler(stop: StopFlag) {
    tokio::spawn(async move {
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to install signal handlers");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, stopping TAs after their current iteration");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, stopping TAs after their current iteration");
            }
            _ = stop.raised() => return,
        }

        stop.raise();
    });
}
