//! Structured health reporting for daemon lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use camino::Utf8Path;

use labcon_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the driver database is open.
    fn registry_opened(&self, path: &Utf8Path, drivers: usize);

    /// Invoked when the gateway socket starts accepting connections.
    fn gateway_listening(&self, endpoint: &SocketEndpoint, local_addr: Option<SocketAddr>);

    /// Invoked after the gateway socket has stopped.
    fn gateway_stopped(&self, endpoint: &SocketEndpoint);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn registry_opened(&self, path: &Utf8Path, drivers: usize) {
        (**self).registry_opened(path, drivers);
    }

    fn gateway_listening(&self, endpoint: &SocketEndpoint, local_addr: Option<SocketAddr>) {
        (**self).gateway_listening(endpoint, local_addr);
    }

    fn gateway_stopped(&self, endpoint: &SocketEndpoint) {
        (**self).gateway_stopped(endpoint);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            database = %config.database_path(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn registry_opened(&self, path: &Utf8Path, drivers: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "registry_opened",
            database = %path,
            drivers,
            "driver registry opened"
        );
    }

    fn gateway_listening(&self, endpoint: &SocketEndpoint, local_addr: Option<SocketAddr>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "gateway_listening",
            endpoint = %endpoint,
            local_addr = local_addr.map(tracing::field::display),
            "gateway accepting connections"
        );
    }

    fn gateway_stopped(&self, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "gateway_stopped",
            endpoint = %endpoint,
            "gateway stopped"
        );
    }
}
