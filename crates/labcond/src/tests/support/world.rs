//! BDD world shared by the bootstrap and lifecycle scenarios.

use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use labcon_config::SocketEndpoint;
use labcon_types::{DriverToken, Reply, Request};

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::gateway::GatewayHandle;

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    test_loader: Option<Arc<TestConfigLoader>>,
    pub reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    gateway: Option<GatewayHandle>,
    bootstrap_error: Option<BootstrapError>,
    tokens: Vec<(String, DriverToken)>,
    last_reply: Option<Reply>,
}

impl TestWorld {
    #[must_use]
    pub fn new() -> Self {
        let loader = Arc::new(TestConfigLoader::new());
        Self {
            loader: Box::new(Arc::clone(&loader)),
            test_loader: Some(loader),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            gateway: None,
            bootstrap_error: None,
            tokens: Vec::new(),
            last_reply: None,
        }
    }

    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.test_loader = None;
    }

    pub fn block_database(&self) {
        self.test_loader
            .as_ref()
            .expect("temporary loader installed")
            .block_database();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone()) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    #[must_use]
    pub fn daemon_started(&self) -> bool {
        self.daemon.is_some()
    }

    pub fn start_gateway(&mut self) {
        self.bootstrap();
        let daemon = self.daemon.as_ref().expect("daemon bootstrapped");
        self.gateway = Some(daemon.start_gateway().expect("start gateway"));
    }

    pub fn stop_gateway(&mut self) {
        if let Some(gateway) = self.gateway.take() {
            gateway.stop().expect("stop gateway");
        }
    }

    /// Sends one request over a fresh connection and keeps the reply.
    pub fn send(&mut self, request: &Request) -> Reply {
        let endpoint = self
            .gateway
            .as_ref()
            .expect("gateway running")
            .client_endpoint();
        let SocketEndpoint::Tcp { host, port } = endpoint else {
            panic!("lifecycle scenarios run over TCP, got {endpoint}");
        };
        let mut stream = TcpStream::connect((host.as_str(), port)).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        let mut line = serde_json::to_string(request).expect("serialise request");
        line.push('\n');
        stream.write_all(line.as_bytes()).expect("write request");
        stream.flush().expect("flush");

        let mut reply = String::new();
        BufReader::new(stream)
            .read_line(&mut reply)
            .expect("read reply");
        let reply: Reply = serde_json::from_str(&reply).expect("reply json");
        self.last_reply = Some(reply.clone());
        reply
    }

    pub fn remember_token(&mut self, name: &str, token: DriverToken) {
        self.tokens.push((name.to_owned(), token));
    }

    #[must_use]
    pub fn token(&self, name: &str) -> DriverToken {
        self.tokens
            .iter()
            .rev()
            .find(|(driver, _)| driver == name)
            .map(|(_, token)| token.clone())
            .unwrap_or_else(|| panic!("no token recorded for {name}"))
    }

    #[must_use]
    pub fn last_reply(&self) -> &Reply {
        self.last_reply.as_ref().expect("a request was sent")
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        if let Some(gateway) = self.gateway.take() {
            let _stopped = gateway.stop();
        }
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
