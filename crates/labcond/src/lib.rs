//! Lab controller daemon.
//!
//! `labcond` keeps a registry of remote driver agents (instrument control
//! processes) and serves it over a JSONL socket gateway. A driver registers
//! once and receives a secret token; it then publishes its state and status
//! and polls for the single operation a control client may dispatch to it.
//!
//! The registry core lives in [`registry`]: a `sled`-backed repository, the
//! [`DriverCoordinator`] state machine, and token generation. At most one
//! operation is ever outstanding per driver; the dispatch gate checks and
//! claims the driver inside one storage transaction.
//!
//! Start-up follows the usual sequence: load configuration, initialise
//! structured telemetry, prepare the socket directory, open the database,
//! then bind the gateway and wait for a termination signal. Health reporting
//! hooks emit a structured event at each stage.

mod bootstrap;
mod dispatch;
mod gateway;
mod health;
mod process;
pub mod registry;
pub mod telemetry;
#[cfg(feature = "test-support")]
pub mod test_support;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::DispatchError;
pub use gateway::GatewayHandle;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon, run_daemon_with,
};
pub use registry::{DriverCoordinator, RegistryError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
