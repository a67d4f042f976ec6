//! Signal handling for graceful shutdown.
//!
//! The host waits here after starting the periodic jobs, then stops them and
//! saves the group snapshot.

use tokio::signal;
use tracing::info;

/// Returns once a termination signal is received.
///
/// # Platform Support
///
/// * **Unix platforms**: Handles SIGINT and SIGTERM signals
/// * **Other platforms**: Handles Ctrl+C
///
/// # Returns
///
/// `Ok(())` when a shutdown signal is received, or an error if a signal
/// listener could not be installed.
pub async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("📡 Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("📡 Received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("📡 Received Ctrl+C");
    }

    Ok(())
}
