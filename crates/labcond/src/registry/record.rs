//! Persisted driver record.

use serde::{Deserialize, Serialize};

use labcon_types::{DriverStatus, DriverToken, Operation, Payload};

/// Everything the registry knows about one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRecord {
    /// Unique, immutable driver name.
    pub name: String,
    /// Credential issued at registration; never reissued.
    pub token: DriverToken,
    /// Opaque application state, replaced wholesale on write.
    pub state: Payload,
    /// Coarse lifecycle flag.
    pub status: DriverStatus,
    /// Outstanding operation, meaningful only while the driver is busy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<Operation>,
}

impl DriverRecord {
    /// Builds the record written at registration: idle with nothing pending.
    pub fn registered(name: impl Into<String>, token: DriverToken, state: Payload) -> Self {
        Self {
            name: name.into(),
            token,
            state,
            status: DriverStatus::Idle,
            op: None,
        }
    }

    /// Returns true when a dispatch may install a new operation.
    #[must_use]
    pub fn accepts_dispatch(&self) -> bool {
        self.status == DriverStatus::Idle && self.op.is_none()
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
