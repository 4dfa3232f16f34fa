//! Connection handler that serves gateway requests.
//!
//! [`DispatchConnectionHandler`] implements the transport layer's
//! `ConnectionHandler`: it reads one bounded request line, validates it,
//! routes it through the registry, and writes exactly one reply line.

use std::io::{self, Read};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use labcon_types::RequestKind;

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::errors::DispatchError;
use super::request::Command;
use super::response::ResponseWriter;
use super::router::{DISPATCH_TARGET, RegistryRouter};

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Connection handler that parses and executes gateway requests.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    router: RegistryRouter,
}

impl DispatchConnectionHandler {
    /// Creates a handler that routes through `router`.
    pub fn new(router: RegistryRouter) -> Self {
        Self { router }
    }

    fn dispatch(&self, mut stream: ConnectionStream) {
        let started = Instant::now();
        let line = match read_request_line(&mut stream) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                reply_error(&mut ResponseWriter::new(&mut stream), &error);
                return;
            }
        };

        let mut writer = ResponseWriter::new(&mut stream);
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request");
                reply_error(&mut writer, &error);
                return;
            }
        };

        let kind = command.kind();
        let driver = command.driver().map(str::to_owned).unwrap_or_default();
        let outcome = self
            .router
            .route(command)
            .and_then(|payload| writer.write_ok(payload));

        match outcome {
            Ok(()) => log_outcome(kind, &driver, started, None),
            Err(error) => {
                log_outcome(kind, &driver, started, Some(&error));
                reply_error(&mut writer, &error);
            }
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}

fn reply_error<W: io::Write>(writer: &mut ResponseWriter<W>, error: &DispatchError) {
    if let Err(write_error) = writer.write_error(error) {
        warn!(target: DISPATCH_TARGET, error = %write_error, "failed to write error reply");
    }
}

fn log_outcome(kind: RequestKind, driver: &str, started: Instant, error: Option<&DispatchError>) {
    let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    match error {
        None => info!(
            target: DISPATCH_TARGET,
            operation = %kind,
            driver,
            elapsed_us,
            outcome = "ok",
            "request served"
        ),
        Some(error) if error.is_internal() => error!(
            target: DISPATCH_TARGET,
            operation = %kind,
            driver,
            elapsed_us,
            outcome = %error.code(),
            %error,
            "request failed"
        ),
        Some(error) => info!(
            target: DISPATCH_TARGET,
            operation = %kind,
            driver,
            elapsed_us,
            outcome = %error.code(),
            %error,
            "request refused"
        ),
    }
}

/// Reads a bounded JSONL request line from the stream.
///
/// Returns `Ok(None)` if the client disconnects without sending data, and
/// `Ok(Some(bytes))` for a complete line or for partial data ended by EOF.
fn read_request_line<R: Read>(stream: &mut R) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;
        let read = &chunk[..bytes_read];

        if read.is_empty() {
            return Ok((!buffer.is_empty()).then_some(buffer));
        }

        if let Some(newline) = read.iter().position(|byte| *byte == b'\n') {
            buffer.extend_from_slice(&read[..=newline]);
            enforce_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(read);
        enforce_limit(buffer.len())?;
    }
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), DispatchError> {
    if size > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(size, MAX_REQUEST_BYTES));
    }
    Ok(())
}
