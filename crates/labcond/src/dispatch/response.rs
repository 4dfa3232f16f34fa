//! Reply serialization for the gateway.
//!
//! Every connection receives exactly one [`Reply`] line: either the
//! operation's result under `ok` or an error object under `error`.

use std::io::Write;

use labcon_types::{Payload, Reply};

use super::errors::DispatchError;

/// Writer that frames replies as JSONL.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a reply line and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_reply(&mut self, reply: &Reply) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, reply)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes a successful reply carrying `payload`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_ok(&mut self, payload: Payload) -> Result<(), DispatchError> {
        self.write_reply(&Reply::Ok(payload))
    }

    /// Writes the client-facing form of `error`.
    ///
    /// Internal failures are reported with a generic message; their detail
    /// stays in the daemon log.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_error(&mut self, error: &DispatchError) -> Result<(), DispatchError> {
        self.write_reply(&Reply::error(error.code(), error.client_message()))
    }
}
