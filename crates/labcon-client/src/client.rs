//! Typed calls to the daemon gateway.
//!
//! Every call opens a fresh connection, writes one request line, and reads
//! one reply line. Error replies become [`ClientError::Daemon`].

use std::io::{BufRead, BufReader, Write};

use serde::de::DeserializeOwned;

use labcon_config::SocketEndpoint;
use labcon_types::{DriverStatus, DriverToken, Operation, Payload, Reply, Request};

use crate::errors::ClientError;
use crate::transport::connect;

/// Handle for calling a daemon at a fixed endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    endpoint: SocketEndpoint,
}

impl Client {
    /// Builds a client for `endpoint`. No connection is made until a call.
    #[must_use]
    pub fn new(endpoint: SocketEndpoint) -> Self {
        Self { endpoint }
    }

    /// Endpoint this client calls.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Registered driver names in key order.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn list(&self) -> Result<Vec<String>, ClientError> {
        self.call_decoded(&Request::list())
    }

    /// Registers `name` with an initial state and returns its token.
    ///
    /// # Errors
    ///
    /// `already_exists` when the name is taken.
    pub fn register(&self, name: &str, state: Payload) -> Result<DriverToken, ClientError> {
        self.call_decoded(&Request::register(name, state))
    }

    /// Current state of `name`.
    ///
    /// # Errors
    ///
    /// `not_found` for unknown drivers.
    pub fn get_state(&self, name: &str) -> Result<Payload, ClientError> {
        self.call(&Request::get_state(name))
    }

    /// Replaces the state of `name`.
    ///
    /// # Errors
    ///
    /// `unauthorized` when `token` is wrong.
    pub fn set_state(
        &self,
        name: &str,
        token: &DriverToken,
        state: Payload,
    ) -> Result<(), ClientError> {
        self.call(&Request::set_state(name, token, state)).map(drop)
    }

    /// Current status of `name`.
    ///
    /// # Errors
    ///
    /// `not_found` for unknown drivers.
    pub fn get_status(&self, name: &str) -> Result<DriverStatus, ClientError> {
        self.call_decoded(&Request::get_status(name))
    }

    /// Sets the status of `name`, clearing any pending operation.
    ///
    /// # Errors
    ///
    /// `unauthorized` when `token` is wrong.
    pub fn set_status(
        &self,
        name: &str,
        token: &DriverToken,
        status: DriverStatus,
    ) -> Result<(), ClientError> {
        self.call(&Request::set_status(name, token, status)).map(drop)
    }

    /// Pending operation of `name`, if any.
    ///
    /// # Errors
    ///
    /// `unauthorized` when `token` is wrong.
    pub fn operation(
        &self,
        name: &str,
        token: &DriverToken,
    ) -> Result<Option<Operation>, ClientError> {
        self.call_decoded(&Request::get_operation(name, token))
    }

    /// Assigns `op` to `name` if the driver is idle.
    ///
    /// # Errors
    ///
    /// `busy` when the driver already has work outstanding.
    pub fn dispatch(&self, name: &str, op: Operation) -> Result<(), ClientError> {
        self.call(&Request::dispatch(name, op)).map(drop)
    }

    /// Removes `name` from the registry.
    ///
    /// # Errors
    ///
    /// `unauthorized` when `token` is wrong.
    pub fn disconnect(&self, name: &str, token: &DriverToken) -> Result<(), ClientError> {
        self.call(&Request::disconnect(name, token)).map(drop)
    }

    /// Sends `request` and returns the raw result payload.
    ///
    /// # Errors
    ///
    /// Returns a transport error or the daemon's refusal.
    pub fn call(&self, request: &Request) -> Result<Payload, ClientError> {
        let mut connection = connect(&self.endpoint)?;
        let mut line = serde_json::to_vec(request).map_err(ClientError::SerialiseRequest)?;
        line.push(b'\n');
        connection
            .write_all(&line)
            .map_err(ClientError::SendRequest)?;
        connection.flush().map_err(ClientError::SendRequest)?;

        let mut reply = String::new();
        let read = BufReader::new(connection)
            .read_line(&mut reply)
            .map_err(ClientError::ReadReply)?;
        if read == 0 {
            return Err(ClientError::MissingReply);
        }
        match serde_json::from_str(&reply).map_err(ClientError::ParseReply)? {
            Reply::Ok(payload) => Ok(payload),
            Reply::Error(details) => Err(ClientError::Daemon {
                code: details.code,
                status: details.status,
                message: details.message,
            }),
        }
    }

    fn call_decoded<T: DeserializeOwned>(&self, request: &Request) -> Result<T, ClientError> {
        self.call(request)?
            .decode()
            .map_err(ClientError::DecodeResult)
    }
}
