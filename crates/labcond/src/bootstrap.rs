//! Daemon bootstrap orchestration.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use thiserror::Error;

use labcon_config::{Config, SocketPreparationError};

use crate::health::HealthReporter;
use crate::registry::{
    DriverCoordinator, DriverRepository, RegistryError, SharedCoordinator, SledDriverRepository,
};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a configuration layer is unusable.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that reads the process arguments, environment, and config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::resolve()
    }
}

/// Loader that hands out a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
    /// The driver database could not be opened.
    #[error("failed to open driver database '{path}': {source}")]
    Storage {
        /// Configured database location.
        path: Utf8PathBuf,
        /// Underlying storage error.
        #[source]
        source: RegistryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    repository: SledDriverRepository,
    coordinator: Arc<SharedCoordinator>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared registry coordinator served by the gateway.
    #[must_use]
    pub fn coordinator(&self) -> Arc<SharedCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    pub(crate) fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }

    /// Writes outstanding registry changes to disk.
    ///
    /// # Errors
    ///
    /// Returns the storage error when the flush fails.
    pub fn flush(&self) -> Result<(), RegistryError> {
        self.repository.flush()
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads configuration, installs telemetry, prepares the socket directory,
/// and opens the driver database. Each failure is reported to `reporter`
/// before it is returned.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] encountered.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    match build_daemon(loader, &reporter) {
        Ok((config, repository, telemetry)) => {
            let coordinator = Arc::new(DriverCoordinator::with_random_tokens(repository.clone()));
            reporter.bootstrap_succeeded(&config);
            Ok(Daemon {
                config,
                repository,
                coordinator,
                telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn build_daemon(
    loader: &dyn ConfigLoader,
    reporter: &Arc<dyn HealthReporter>,
) -> Result<(Config, SledDriverRepository, TelemetryHandle), BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    config
        .daemon_socket()
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;

    let path = config.database_path();
    let storage_error = |source| BootstrapError::Storage {
        path: path.to_owned(),
        source,
    };
    let repository = SledDriverRepository::open(path).map_err(storage_error)?;
    let drivers = repository.list().map_err(storage_error)?.len();
    reporter.registry_opened(path, drivers);

    Ok((config, repository, telemetry))
}
