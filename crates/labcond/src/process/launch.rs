//! Runs the daemon in the foreground until a shutdown signal arrives.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns the first failure in bootstrap, listener start-up, signal
/// handling, or the final database flush.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal,
    )
}

/// Runs the daemon with injected collaborators.
///
/// The gateway is stopped before the database is flushed, so every write
/// accepted before shutdown is on disk when this returns.
///
/// # Errors
///
/// See [`run_daemon`].
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, reporter)?;
    let gateway = daemon.start_gateway()?;
    info!(
        target: PROCESS_TARGET,
        pid = std::process::id(),
        endpoint = %gateway.endpoint(),
        "daemon running"
    );

    let waited = shutdown.wait();
    gateway.stop()?;
    daemon
        .flush()
        .map_err(|source| LaunchError::Flush { source })?;
    waited?;

    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
