//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use tempfile::TempDir;

use labcon_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that places the database under a temporary directory and listens
/// on an ephemeral loopback port.
pub struct TestConfigLoader {
    dir: TempDir,
    endpoint: SocketEndpoint,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temporary directory"),
            endpoint: SocketEndpoint::tcp("127.0.0.1", 0),
        }
    }

    /// Listens on a Unix socket inside the temporary directory instead.
    #[cfg(unix)]
    #[must_use]
    pub fn unix() -> Self {
        let loader = Self::new();
        let endpoint = SocketEndpoint::unix(loader.root().join("run").join("labcond.sock"));
        Self { endpoint, ..loader }
    }

    /// Occupies the database path with a regular file so opening fails.
    pub fn block_database(&self) {
        fs::write(self.database_path(), b"not a database").expect("write blocking file");
    }

    pub fn database_path(&self) -> Utf8PathBuf {
        self.root().join("labcon.db")
    }

    fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf())
            .expect("temporary directory was not valid UTF-8")
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            daemon_socket: self.endpoint.clone(),
            database_path: self.database_path(),
            log_filter: "warn".to_owned(),
            ..Config::default()
        })
    }
}

impl ConfigLoader for Arc<TestConfigLoader> {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        (**self).load()
    }
}

/// Loader that intentionally fails by passing an unsupported socket scheme.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::resolve_from([
            OsString::from("labcond"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ])
    }
}
