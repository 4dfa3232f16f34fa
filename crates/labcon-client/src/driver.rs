//! Agent-side handle for a registered driver.

use labcon_types::{DriverStatus, DriverToken, Operation, Payload};

use crate::client::Client;
use crate::errors::ClientError;

/// A registered driver that remembers its name and token.
///
/// Agents poll [`Driver::operation`], run the work, publish results with
/// [`Driver::set_state`], and report back with [`Driver::set_status`]:
///
/// ```no_run
/// use labcon_client::{Client, Driver};
/// use labcon_config::SocketEndpoint;
/// use labcon_types::{DriverStatus, Payload};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new(SocketEndpoint::tcp("127.0.0.1", 5000));
/// let driver = Driver::register(client, "spectrometer", Payload::parse("{}")?)?;
/// if let Some(op) = driver.operation()? {
///     println!("running {}", op.name);
///     driver.set_status(DriverStatus::Idle)?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Driver {
    client: Client,
    name: String,
    token: DriverToken,
}

impl Driver {
    /// Registers `name` and keeps the issued token.
    ///
    /// # Errors
    ///
    /// `already_exists` when the name is taken.
    pub fn register(
        client: Client,
        name: impl Into<String>,
        state: Payload,
    ) -> Result<Self, ClientError> {
        let name = name.into();
        let token = client.register(&name, state)?;
        Ok(Self::attach(client, name, token))
    }

    /// Reattaches to a driver registered earlier.
    pub fn attach(client: Client, name: impl Into<String>, token: DriverToken) -> Self {
        Self {
            client,
            name: name.into(),
            token,
        }
    }

    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token issued at registration.
    #[must_use]
    pub fn token(&self) -> &DriverToken {
        &self.token
    }

    /// Current state.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn get_state(&self) -> Result<Payload, ClientError> {
        self.client.get_state(&self.name)
    }

    /// Publishes a new state.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn set_state(&self, state: Payload) -> Result<(), ClientError> {
        self.client.set_state(&self.name, &self.token, state)
    }

    /// Current status.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn get_status(&self) -> Result<DriverStatus, ClientError> {
        self.client.get_status(&self.name)
    }

    /// Reports a status, clearing the pending operation.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn set_status(&self, status: DriverStatus) -> Result<(), ClientError> {
        self.client.set_status(&self.name, &self.token, status)
    }

    /// Pending operation, if any.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn operation(&self) -> Result<Option<Operation>, ClientError> {
        self.client.operation(&self.name, &self.token)
    }

    /// Dispatches `op` to this driver, as a control client would.
    ///
    /// # Errors
    ///
    /// `busy` when work is already outstanding.
    pub fn dispatch(&self, op: Operation) -> Result<(), ClientError> {
        self.client.dispatch(&self.name, op)
    }

    /// Removes this driver from the registry.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn disconnect(self) -> Result<(), ClientError> {
        self.client.disconnect(&self.name, &self.token)
    }
}
