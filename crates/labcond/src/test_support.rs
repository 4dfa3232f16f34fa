//! In-process daemon for integration tests in other crates.

use std::error::Error;
use std::sync::Arc;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use labcon_config::{Config, SocketEndpoint};

use crate::bootstrap::{Daemon, StaticConfigLoader, bootstrap_with};
use crate::gateway::GatewayHandle;
use crate::health::StructuredHealthReporter;

/// Boxed error returned by the harness.
pub type HarnessError = Box<dyn Error + Send + Sync>;

/// A daemon serving a throwaway database until dropped.
pub struct TestServer {
    daemon: Daemon,
    gateway: Option<GatewayHandle>,
    _dir: TempDir,
}

impl TestServer {
    /// Serves on an ephemeral loopback TCP port.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory, database, or listener
    /// cannot be set up.
    pub fn start() -> Result<Self, HarnessError> {
        Self::start_on(|_| SocketEndpoint::tcp("127.0.0.1", 0))
    }

    /// Serves on a Unix socket inside the temporary directory.
    ///
    /// # Errors
    ///
    /// See [`TestServer::start`].
    #[cfg(unix)]
    pub fn start_unix() -> Result<Self, HarnessError> {
        Self::start_on(|dir| SocketEndpoint::unix(dir.join("labcond.sock")))
    }

    fn start_on(
        endpoint: impl FnOnce(&Utf8PathBuf) -> SocketEndpoint,
    ) -> Result<Self, HarnessError> {
        let dir = tempfile::tempdir()?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| format!("temporary directory {} is not UTF-8", path.display()))?;
        let config = Config {
            daemon_socket: endpoint(&root),
            database_path: root.join("labcon.db"),
            log_filter: "warn".to_owned(),
            ..Config::default()
        };
        let daemon = bootstrap_with(
            &StaticConfigLoader::new(config),
            Arc::new(StructuredHealthReporter::new()),
        )?;
        let gateway = daemon.start_gateway()?;
        Ok(Self {
            daemon,
            gateway: Some(gateway),
            _dir: dir,
        })
    }

    /// Endpoint clients should connect to.
    #[must_use]
    pub fn endpoint(&self) -> SocketEndpoint {
        self.gateway.as_ref().map_or_else(
            || self.daemon.config().daemon_socket().clone(),
            GatewayHandle::client_endpoint,
        )
    }

    /// The bootstrapped daemon, for direct registry inspection.
    #[must_use]
    pub fn daemon(&self) -> &Daemon {
        &self.daemon
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(gateway) = self.gateway.take() {
            let _stopped = gateway.stop();
        }
    }
}
