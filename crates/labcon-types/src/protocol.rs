//! Request and reply envelopes exchanged with the daemon.
//!
//! Each connection carries exactly one request line and one reply line:
//!
//! ```json
//! {"operation":"dispatch","name":"spectrometer","op":{"name":"scan"}}
//! {"ok":null}
//! ```
//!
//! Failures are reported with a stable code and the matching numeric status:
//!
//! ```json
//! {"error":{"code":"busy","status":409,"message":"driver 'spectrometer' is busy"}}
//! ```

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{DriverStatus, DriverToken, Operation, Payload};

/// Operations understood by the daemon gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RequestKind {
    /// Lists registered driver names.
    List,
    /// Registers a new driver and returns its token.
    Register,
    /// Reads a driver's state.
    GetState,
    /// Replaces a driver's state.
    SetState,
    /// Reads a driver's status.
    GetStatus,
    /// Writes a driver's status, clearing any pending operation.
    SetStatus,
    /// Reads a driver's pending operation.
    GetOperation,
    /// Assigns an operation to an idle driver.
    Dispatch,
    /// Removes a driver from the registry.
    Disconnect,
}

/// Request envelope sent by clients.
///
/// Fields that an operation does not use are omitted from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Requested operation.
    pub operation: RequestKind,
    /// Target driver name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Driver token for calls made on the driver's behalf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<DriverToken>,
    /// Driver state for `register` and `set-state`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Payload>,
    /// New status for `set-status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DriverStatus>,
    /// Operation to assign for `dispatch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<Operation>,
}

impl Request {
    fn bare(operation: RequestKind) -> Self {
        Self {
            operation,
            name: None,
            token: None,
            state: None,
            status: None,
            op: None,
        }
    }

    fn named(operation: RequestKind, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::bare(operation)
        }
    }

    fn authorised(operation: RequestKind, name: impl Into<String>, token: &DriverToken) -> Self {
        Self {
            token: Some(token.clone()),
            ..Self::named(operation, name)
        }
    }

    /// Builds a `list` request.
    #[must_use]
    pub fn list() -> Self {
        Self::bare(RequestKind::List)
    }

    /// Builds a `register` request.
    pub fn register(name: impl Into<String>, state: Payload) -> Self {
        Self {
            state: Some(state),
            ..Self::named(RequestKind::Register, name)
        }
    }

    /// Builds a `get-state` request.
    pub fn get_state(name: impl Into<String>) -> Self {
        Self::named(RequestKind::GetState, name)
    }

    /// Builds a `set-state` request.
    pub fn set_state(name: impl Into<String>, token: &DriverToken, state: Payload) -> Self {
        Self {
            state: Some(state),
            ..Self::authorised(RequestKind::SetState, name, token)
        }
    }

    /// Builds a `get-status` request.
    pub fn get_status(name: impl Into<String>) -> Self {
        Self::named(RequestKind::GetStatus, name)
    }

    /// Builds a `set-status` request.
    pub fn set_status(name: impl Into<String>, token: &DriverToken, status: DriverStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::authorised(RequestKind::SetStatus, name, token)
        }
    }

    /// Builds a `get-operation` request.
    pub fn get_operation(name: impl Into<String>, token: &DriverToken) -> Self {
        Self::authorised(RequestKind::GetOperation, name, token)
    }

    /// Builds a `dispatch` request. Dispatch is a control-plane call and
    /// carries no driver token.
    pub fn dispatch(name: impl Into<String>, op: Operation) -> Self {
        Self {
            op: Some(op),
            ..Self::named(RequestKind::Dispatch, name)
        }
    }

    /// Builds a `disconnect` request.
    pub fn disconnect(name: impl Into<String>, token: &DriverToken) -> Self {
        Self::authorised(RequestKind::Disconnect, name, token)
    }
}

/// Stable failure categories reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed or missed a required field.
    BadRequest,
    /// The presented token does not match the driver's token.
    Unauthorized,
    /// No driver is registered under the given name.
    NotFound,
    /// A driver with the given name is already registered.
    AlreadyExists,
    /// The driver already has work outstanding; retry later.
    Busy,
    /// The daemon failed internally.
    Internal,
}

impl ErrorCode {
    /// Numeric status associated with the code, following HTTP conventions.
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::AlreadyExists | Self::Busy => 409,
            Self::Internal => 500,
        }
    }
}

/// Failure details carried by an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// Failure category.
    pub code: ErrorCode,
    /// Numeric status matching [`ErrorCode::status`].
    pub status: u16,
    /// Human-readable description.
    pub message: String,
}

/// Reply envelope written by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    /// Successful result; the payload shape depends on the operation.
    Ok(Payload),
    /// Failed request.
    Error(ErrorReply),
}

impl Reply {
    /// Builds an error reply for the given code.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorReply {
            code,
            status: code.status(),
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_request_omits_unused_fields() {
        let request = Request::dispatch("spectrometer", Operation::new("scan"));
        let text = serde_json::to_string(&request).expect("serialise");
        assert_eq!(
            text,
            r#"{"operation":"dispatch","name":"spectrometer","op":{"name":"scan"}}"#
        );
    }

    #[test]
    fn set_status_request_carries_token() {
        let token = DriverToken::new("TOKEN");
        let request = Request::set_status("pump", &token, DriverStatus::Idle);
        let text = serde_json::to_string(&request).expect("serialise");
        assert_eq!(
            text,
            r#"{"operation":"set-status","name":"pump","token":"TOKEN","status":"idle"}"#
        );
    }

    #[test]
    fn register_request_parses_raw_state() {
        let parsed: Request = serde_json::from_str(
            r#"{"operation":"register","name":"pump","state":{"rate": 2.5}}"#,
        )
        .expect("deserialise");
        assert_eq!(parsed.operation, RequestKind::Register);
        assert_eq!(
            parsed.state.map(|state| state.as_json().to_owned()),
            Some(r#"{"rate": 2.5}"#.to_owned())
        );
    }

    #[test]
    fn error_reply_includes_status() {
        let reply = Reply::error(ErrorCode::Busy, "driver 'pump' is busy");
        let text = serde_json::to_string(&reply).expect("serialise");
        assert_eq!(
            text,
            r#"{"error":{"code":"busy","status":409,"message":"driver 'pump' is busy"}}"#
        );
    }

    #[test]
    fn ok_reply_round_trips() {
        let reply = Reply::Ok(Payload::encode(&vec!["a", "c"]).expect("encode"));
        let text = serde_json::to_string(&reply).expect("serialise");
        assert_eq!(text, r#"{"ok":["a","c"]}"#);
        let decoded: Reply = serde_json::from_str(&text).expect("deserialise");
        assert_eq!(decoded, reply);
    }
}
