//! Opaque JSON payloads carried for drivers.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Application-defined JSON document stored and returned verbatim.
///
/// The registry never looks inside a payload: driver state and operation
/// arguments travel as raw JSON text so that whatever schema the driver and
/// its control clients agree on survives untouched. Two payloads compare
/// equal when their JSON text is identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Box<RawValue>);

impl Payload {
    /// Parses JSON text into a payload, validating that it is well formed.
    ///
    /// # Errors
    ///
    /// Returns the parser error when `text` is not a single JSON value.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        RawValue::from_string(text.trim().to_owned()).map(Self)
    }

    /// Serialises a value into a payload.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error when `value` cannot be represented as JSON.
    pub fn encode<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        serde_json::value::to_raw_value(value).map(Self)
    }

    /// Decodes the payload into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns the deserialiser error when the JSON does not match `T`.
    pub fn decode<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(self.0.get())
    }

    /// JSON `null`.
    #[must_use]
    pub fn null() -> Self {
        Self(RawValue::NULL.to_owned())
    }

    /// Returns the raw JSON text.
    #[must_use]
    pub fn as_json(&self) -> &str {
        self.0.get()
    }

    /// Returns true when the payload is the JSON literal `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.get() == "null"
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.0.get() == other.0.get()
    }
}

impl Eq for Payload {}

impl fmt::Display for Payload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.0.get())
    }
}
