//! Error taxonomy for the driver registry.

use sled::transaction::TransactionError;
use thiserror::Error;

/// Failures surfaced by the repository and coordinator.
///
/// `Storage` and `Codec` are opaque engine failures; the remaining variants
/// are business outcomes that callers are expected to handle.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No driver is registered under the name.
    #[error("driver '{name}' not found")]
    NotFound { name: String },

    /// A driver with the name is already registered.
    #[error("driver '{name}' already exists")]
    AlreadyExists { name: String },

    /// Dispatch was refused because the driver has work outstanding.
    ///
    /// This is the dispatch-side conflict, in the same class as
    /// [`Self::AlreadyExists`]: an operation slot that is already taken. It
    /// stays a separate variant so clients can tell "retry later" apart from
    /// a duplicate registration.
    #[error("driver '{name}' is busy")]
    Busy { name: String },

    /// The presented token does not match the stored token.
    #[error("unauthorized access to driver '{name}'")]
    Unauthorized { name: String },

    /// The storage engine failed.
    #[error("storage engine failure: {0}")]
    Storage(#[from] sled::Error),

    /// A stored record could not be encoded or decoded.
    #[error("failed to encode driver record '{name}': {source}")]
    Codec {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistryError {
    pub(crate) fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_owned(),
        }
    }

    pub(crate) fn already_exists(name: &str) -> Self {
        Self::AlreadyExists {
            name: name.to_owned(),
        }
    }

    pub(crate) fn busy(name: &str) -> Self {
        Self::Busy {
            name: name.to_owned(),
        }
    }

    pub(crate) fn unauthorized(name: &str) -> Self {
        Self::Unauthorized {
            name: name.to_owned(),
        }
    }

    pub(crate) fn codec(name: &str, source: serde_json::Error) -> Self {
        Self::Codec {
            name: name.to_owned(),
            source,
        }
    }
}

impl From<TransactionError<RegistryError>> for RegistryError {
    fn from(error: TransactionError<RegistryError>) -> Self {
        match error {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(source) => Self::Storage(source),
        }
    }
}
