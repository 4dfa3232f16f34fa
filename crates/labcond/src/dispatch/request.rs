//! Request parsing and validation for the gateway.
//!
//! A request line is first decoded into the shared [`Request`] envelope and
//! then checked into a [`Command`] that carries exactly the fields its
//! operation needs. Nothing reaches the registry until that check passes.

use labcon_types::{DriverStatus, DriverToken, Operation, Payload, Request, RequestKind};

use super::errors::DispatchError;

/// A validated gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List registered drivers.
    List,
    /// Register a new driver.
    Register { name: String, state: Payload },
    /// Read a driver's state.
    GetState { name: String },
    /// Replace a driver's state.
    SetState {
        name: String,
        token: DriverToken,
        state: Payload,
    },
    /// Read a driver's status.
    GetStatus { name: String },
    /// Write a driver's status.
    SetStatus {
        name: String,
        token: DriverToken,
        status: DriverStatus,
    },
    /// Read the pending operation.
    GetOperation { name: String, token: DriverToken },
    /// Assign an operation to an idle driver.
    Dispatch { name: String, op: Operation },
    /// Remove a driver.
    Disconnect { name: String, token: DriverToken },
}

impl Command {
    /// Parses a JSONL line into a validated command.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed
    /// before parsing.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MalformedJsonl` when the line is empty or not a
    /// request envelope, and a field error when validation fails.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }
        let request: Request =
            serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)?;
        Self::validate(request)
    }

    /// Checks that `request` carries every field its operation needs.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MissingField` or `DispatchError::InvalidField`
    /// describing the first problem found.
    pub fn validate(request: Request) -> Result<Self, DispatchError> {
        let mut fields = Fields::new(request);
        let command = match fields.kind {
            RequestKind::List => Self::List,
            RequestKind::Register => Self::Register {
                name: fields.name()?,
                state: fields.state()?,
            },
            RequestKind::GetState => Self::GetState {
                name: fields.name()?,
            },
            RequestKind::SetState => Self::SetState {
                name: fields.name()?,
                token: fields.token()?,
                state: fields.state()?,
            },
            RequestKind::GetStatus => Self::GetStatus {
                name: fields.name()?,
            },
            RequestKind::SetStatus => Self::SetStatus {
                name: fields.name()?,
                token: fields.token()?,
                status: fields.status()?,
            },
            RequestKind::GetOperation => Self::GetOperation {
                name: fields.name()?,
                token: fields.token()?,
            },
            RequestKind::Dispatch => Self::Dispatch {
                name: fields.name()?,
                op: fields.op()?,
            },
            RequestKind::Disconnect => Self::Disconnect {
                name: fields.name()?,
                token: fields.token()?,
            },
        };
        Ok(command)
    }

    /// Operation this command performs.
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::List => RequestKind::List,
            Self::Register { .. } => RequestKind::Register,
            Self::GetState { .. } => RequestKind::GetState,
            Self::SetState { .. } => RequestKind::SetState,
            Self::GetStatus { .. } => RequestKind::GetStatus,
            Self::SetStatus { .. } => RequestKind::SetStatus,
            Self::GetOperation { .. } => RequestKind::GetOperation,
            Self::Dispatch { .. } => RequestKind::Dispatch,
            Self::Disconnect { .. } => RequestKind::Disconnect,
        }
    }

    /// Target driver, if the command names one.
    pub fn driver(&self) -> Option<&str> {
        match self {
            Self::List => None,
            Self::Register { name, .. }
            | Self::GetState { name }
            | Self::SetState { name, .. }
            | Self::GetStatus { name }
            | Self::SetStatus { name, .. }
            | Self::GetOperation { name, .. }
            | Self::Dispatch { name, .. }
            | Self::Disconnect { name, .. } => Some(name),
        }
    }
}

/// Moves fields out of a request, reporting the first one that is unusable.
struct Fields {
    kind: RequestKind,
    operation: &'static str,
    request: Request,
}

impl Fields {
    fn new(request: Request) -> Self {
        Self {
            kind: request.operation,
            operation: operation_label(request.operation),
            request,
        }
    }

    fn missing(&self, field: &'static str) -> DispatchError {
        DispatchError::missing_field(self.operation, field)
    }

    fn name(&mut self) -> Result<String, DispatchError> {
        let name = self.request.name.take().ok_or_else(|| self.missing("name"))?;
        if name.trim().is_empty() {
            return Err(DispatchError::invalid_field("name", "must not be blank"));
        }
        Ok(name)
    }

    fn token(&mut self) -> Result<DriverToken, DispatchError> {
        let token = self
            .request
            .token
            .take()
            .ok_or_else(|| self.missing("token"))?;
        if token.is_blank() {
            return Err(DispatchError::invalid_field("token", "must not be blank"));
        }
        Ok(token)
    }

    // A JSON `null` state deserialises to `None` and is reported as missing.
    fn state(&mut self) -> Result<Payload, DispatchError> {
        self.request
            .state
            .take()
            .ok_or_else(|| self.missing("state"))
    }

    fn status(&mut self) -> Result<DriverStatus, DispatchError> {
        self.request
            .status
            .take()
            .ok_or_else(|| self.missing("status"))
    }

    fn op(&mut self) -> Result<Operation, DispatchError> {
        let op = self.request.op.take().ok_or_else(|| self.missing("op"))?;
        if op.name.trim().is_empty() {
            return Err(DispatchError::invalid_field(
                "op.name",
                "operation name must not be blank",
            ));
        }
        Ok(op)
    }
}

const fn operation_label(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::List => "list",
        RequestKind::Register => "register",
        RequestKind::GetState => "get-state",
        RequestKind::SetState => "set-state",
        RequestKind::GetStatus => "get-status",
        RequestKind::SetStatus => "set-status",
        RequestKind::GetOperation => "get-operation",
        RequestKind::Dispatch => "dispatch",
        RequestKind::Disconnect => "disconnect",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn parses_list_request() {
        let command = Command::parse(b"{\"operation\":\"list\"}\n").expect("parse list");
        assert_eq!(command, Command::List);
        assert_eq!(command.driver(), None);
    }

    #[test]
    fn parses_register_request_with_raw_state() {
        let command =
            Command::parse(br#"{"operation":"register","name":"cam","state":{"gain": 2}}"#)
                .expect("parse register");
        let Command::Register { name, state } = command else {
            panic!("expected register, got {command:?}");
        };
        assert_eq!(name, "cam");
        assert_eq!(state.as_json(), r#"{"gain": 2}"#);
    }

    #[test]
    fn parses_dispatch_without_token() {
        let command = Command::parse(
            br#"{"operation":"dispatch","name":"cam","op":{"name":"scan","arg":[1]}}"#,
        )
        .expect("parse dispatch");
        assert_eq!(command.kind(), RequestKind::Dispatch);
        assert_eq!(command.driver(), Some("cam"));
    }

    #[rstest]
    #[case::empty(b"".as_slice())]
    #[case::whitespace(b"  \n".as_slice())]
    #[case::not_json(b"not json".as_slice())]
    #[case::unknown_operation(br#"{"operation":"reboot"}"#.as_slice())]
    #[case::bad_status(br#"{"operation":"set-status","name":"a","token":"t","status":"asleep"}"#.as_slice())]
    fn rejects_malformed_lines(#[case] line: &[u8]) {
        assert!(matches!(
            Command::parse(line),
            Err(DispatchError::MalformedJsonl { .. })
        ));
    }

    #[rstest]
    #[case::register_without_name(br#"{"operation":"register","state":1}"#.as_slice(), "name")]
    #[case::register_without_state(br#"{"operation":"register","name":"cam"}"#.as_slice(), "state")]
    #[case::register_with_null_state(br#"{"operation":"register","name":"cam","state":null}"#.as_slice(), "state")]
    #[case::set_state_without_token(br#"{"operation":"set-state","name":"cam","state":1}"#.as_slice(), "token")]
    #[case::set_status_without_status(br#"{"operation":"set-status","name":"cam","token":"t"}"#.as_slice(), "status")]
    #[case::dispatch_without_op(br#"{"operation":"dispatch","name":"cam"}"#.as_slice(), "op")]
    #[case::disconnect_without_token(br#"{"operation":"disconnect","name":"cam"}"#.as_slice(), "token")]
    fn reports_missing_fields(#[case] line: &[u8], #[case] expected: &str) {
        let error = Command::parse(line).expect_err("missing field");
        assert!(
            matches!(&error, DispatchError::MissingField { field, .. } if *field == expected),
            "unexpected error: {error}"
        );
    }

    #[rstest]
    #[case::blank_name(br#"{"operation":"get-state","name":"  "}"#.as_slice(), "name")]
    #[case::blank_token(br#"{"operation":"get-operation","name":"cam","token":""}"#.as_slice(), "token")]
    #[case::blank_op_name(br#"{"operation":"dispatch","name":"cam","op":{"name":" "}}"#.as_slice(), "op.name")]
    fn reports_blank_fields(#[case] line: &[u8], #[case] expected: &str) {
        let error = Command::parse(line).expect_err("blank field");
        assert!(
            matches!(&error, DispatchError::InvalidField { field, .. } if *field == expected),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn operation_labels_match_the_wire_names() {
        for kind in [
            RequestKind::List,
            RequestKind::GetOperation,
            RequestKind::SetStatus,
        ] {
            assert_eq!(operation_label(kind), kind.to_string());
        }
    }
}
