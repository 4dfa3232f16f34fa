//! Test double for [`HealthReporter`] that records lifecycle events.

use std::net::SocketAddr;
use std::sync::Mutex;

use camino::Utf8Path;

use labcon_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    RegistryOpened { drivers: usize },
    GatewayListening(SocketEndpoint),
    GatewayStopped(SocketEndpoint),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn registry_opened(&self, _path: &Utf8Path, drivers: usize) {
        self.record(HealthEvent::RegistryOpened { drivers });
    }

    fn gateway_listening(&self, endpoint: &SocketEndpoint, _local_addr: Option<SocketAddr>) {
        self.record(HealthEvent::GatewayListening(endpoint.clone()));
    }

    fn gateway_stopped(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::GatewayStopped(endpoint.clone()));
    }
}
