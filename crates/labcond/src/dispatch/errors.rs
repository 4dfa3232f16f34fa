//! Error types for gateway request handling.
//!
//! Every failure that can happen between reading a request line and writing
//! the reply is a [`DispatchError`]. Each variant knows which [`ErrorCode`]
//! the client sees and whether its detail may be shown to the client.

use std::io;

use thiserror::Error;

use labcon_types::ErrorCode;

use crate::registry::RegistryError;

/// Message sent to clients in place of internal failure detail.
pub(crate) const INTERNAL_MESSAGE: &str = "internal error; see daemon logs";

/// Errors surfaced during request parsing, validation, and execution.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request line could not be parsed as a request envelope.
    #[error("malformed JSONL: {message}")]
    MalformedJsonl {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A field the operation requires is absent.
    #[error("missing required field '{field}' for {operation}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    /// A field is present but unusable.
    #[error("invalid field '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// Request exceeds the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },

    /// The registry refused or failed the call.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Reply serialization failed.
    #[error("failed to serialize reply: {0}")]
    SerializeReply(#[from] serde_json::Error),
}

impl DispatchError {
    /// Returns the error code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedJsonl { .. }
            | Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::RequestTooLarge { .. } => ErrorCode::BadRequest,
            Self::Registry(error) => registry_code(error),
            Self::Io(_) | Self::SerializeReply(_) => ErrorCode::Internal,
        }
    }

    /// Returns true when the failure is the daemon's fault rather than the
    /// caller's.
    pub fn is_internal(&self) -> bool {
        self.code() == ErrorCode::Internal
    }

    /// Message safe to show the client.
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            INTERNAL_MESSAGE.to_owned()
        } else {
            self.to_string()
        }
    }

    /// Creates a malformed JSONL error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedJsonl {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed JSONL error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJsonl {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(operation: &'static str, field: &'static str) -> Self {
        Self::MissingField { operation, field }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Creates a request too large error.
    pub fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}

fn registry_code(error: &RegistryError) -> ErrorCode {
    match error {
        RegistryError::NotFound { .. } => ErrorCode::NotFound,
        RegistryError::AlreadyExists { .. } => ErrorCode::AlreadyExists,
        RegistryError::Busy { .. } => ErrorCode::Busy,
        RegistryError::Unauthorized { .. } => ErrorCode::Unauthorized,
        RegistryError::Storage(_) | RegistryError::Codec { .. } => ErrorCode::Internal,
    }
}
