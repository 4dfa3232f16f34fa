//! Running gateway: the socket listener wired to the registry.

use std::net::SocketAddr;
use std::sync::Arc;

use labcon_config::SocketEndpoint;

use crate::bootstrap::Daemon;
use crate::dispatch::{DispatchConnectionHandler, RegistryRouter};
use crate::health::HealthReporter;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// Handle to a gateway accepting connections in the background.
pub struct GatewayHandle {
    endpoint: SocketEndpoint,
    local_addr: Option<SocketAddr>,
    listener: ListenerHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl GatewayHandle {
    /// Endpoint the gateway was configured with.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Bound TCP address, resolving an ephemeral port. `None` for Unix
    /// sockets.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Endpoint clients should connect to.
    #[must_use]
    pub fn client_endpoint(&self) -> SocketEndpoint {
        match self.local_addr {
            Some(addr) => SocketEndpoint::tcp(addr.ip().to_string(), addr.port()),
            None => self.endpoint.clone(),
        }
    }

    /// Stops accepting connections and waits for the accept loop to exit.
    /// Connections already being served run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept loop panicked.
    pub fn stop(self) -> Result<(), ListenerError> {
        self.listener.shutdown();
        self.listener.join()?;
        self.reporter.gateway_stopped(&self.endpoint);
        Ok(())
    }
}

impl Daemon {
    /// Binds the configured endpoint and starts serving the registry.
    ///
    /// # Errors
    ///
    /// Returns the listener error when the endpoint cannot be bound.
    pub fn start_gateway(&self) -> Result<GatewayHandle, ListenerError> {
        let listener = SocketListener::bind(self.config().daemon_socket())?;
        let endpoint = listener.endpoint().clone();
        let local_addr = listener.local_addr();
        let handler = Arc::new(DispatchConnectionHandler::new(RegistryRouter::new(
            self.coordinator(),
        )));
        let listener = listener.start(handler)?;
        let reporter = self.reporter();
        reporter.gateway_listening(&endpoint, local_addr);
        Ok(GatewayHandle {
            endpoint,
            local_addr,
            listener,
            reporter,
        })
    }
}
