//! Error types for the client library and the `labcon` runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use labcon_types::ErrorCode;

/// Failures surfaced while calling the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The TCP host name did not resolve.
    #[error("failed to resolve daemon address {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The daemon could not be reached.
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect {
        /// Endpoint being dialled.
        endpoint: String,
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are unavailable on this platform.
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    /// The request could not be encoded.
    #[error("failed to serialise request: {0}")]
    SerialiseRequest(#[source] serde_json::Error),
    /// Writing the request failed.
    #[error("failed to send request to daemon: {0}")]
    SendRequest(#[source] io::Error),
    /// Reading the reply failed.
    #[error("failed to read reply from daemon: {0}")]
    ReadReply(#[source] io::Error),
    /// The daemon closed the connection without replying.
    #[error("daemon closed the connection without replying")]
    MissingReply,
    /// The reply line was not a reply envelope.
    #[error("failed to parse daemon reply: {0}")]
    ParseReply(#[source] serde_json::Error),
    /// The reply payload did not have the expected shape.
    #[error("unexpected result from daemon: {0}")]
    DecodeResult(#[source] serde_json::Error),
    /// The daemon refused the request.
    #[error("daemon refused request ({code}, {status}): {message}")]
    Daemon {
        /// Stable failure category.
        code: ErrorCode,
        /// Numeric status matching the code.
        status: u16,
        /// Description from the daemon.
        message: String,
    },
}

impl ClientError {
    /// Failure category reported by the daemon, if the daemon refused the
    /// request.
    #[must_use]
    pub fn daemon_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Daemon { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid {what} JSON: {source}")]
    InvalidJson {
        what: &'static str,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
