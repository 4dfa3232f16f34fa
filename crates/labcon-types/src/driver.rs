//! Driver status, pending operations, and access tokens.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::Payload;

/// Coarse lifecycle flag describing whether a driver has outstanding work.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DriverStatus {
    /// Ready to accept an operation.
    #[default]
    Idle,
    /// Executing (or about to execute) a dispatched operation.
    Busy,
    /// The driver agent is no longer reachable.
    Lost,
    /// The driver agent reported a failure.
    Error,
}

/// An action requested of a driver together with its optional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Identifier of the requested action.
    pub name: String,
    /// Optional argument interpreted by the driver agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<Payload>,
}

impl Operation {
    /// Builds an operation without an argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arg: None,
        }
    }

    /// Attaches an argument to the operation.
    #[must_use]
    pub fn with_arg(mut self, arg: Payload) -> Self {
        self.arg = Some(arg);
        self
    }
}

/// Secret issued to a driver at registration.
///
/// The token is required for every call made on the driver's behalf. Its
/// `Debug` output is redacted so it never lands in logs by accident.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverToken(String);

impl DriverToken {
    /// Wraps token text.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the token text is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for DriverToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("DriverToken(<redacted>)")
    }
}

impl From<String> for DriverToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}
