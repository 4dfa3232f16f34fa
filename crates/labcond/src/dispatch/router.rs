//! Routes validated commands to the driver coordinator.
//!
//! Calls made on a driver's behalf (`set-state`, `set-status`,
//! `get-operation`, `disconnect`) hand the presented token to the
//! coordinator, which checks it inside the same transaction as the read or
//! write it guards. `dispatch` is a control-plane call and carries no token.

use std::sync::Arc;

use tracing::debug;

use labcon_types::Payload;

use super::errors::DispatchError;
use super::request::Command;
use crate::registry::SharedCoordinator;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Executes gateway commands against a shared coordinator.
#[derive(Debug, Clone)]
pub struct RegistryRouter {
    coordinator: Arc<SharedCoordinator>,
}

impl RegistryRouter {
    /// Creates a router over `coordinator`.
    pub fn new(coordinator: Arc<SharedCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Runs `command` and returns the reply payload.
    ///
    /// # Errors
    ///
    /// Returns the registry failure (not found, unauthorized, busy, and so
    /// on) or a serialization error for the result.
    pub fn route(&self, command: Command) -> Result<Payload, DispatchError> {
        debug!(
            target: DISPATCH_TARGET,
            operation = %command.kind(),
            driver = command.driver().unwrap_or_default(),
            "routing command"
        );

        let registry = &self.coordinator;
        match command {
            Command::List => encode(&registry.list()?),
            Command::Register { name, state } => encode(&registry.register(&name, &state)?),
            Command::GetState { name } => Ok(registry.get_state(&name)?),
            Command::SetState { name, token, state } => {
                registry.set_state(&name, &token, &state)?;
                Ok(Payload::null())
            }
            Command::GetStatus { name } => encode(&registry.get_status(&name)?),
            Command::SetStatus {
                name,
                token,
                status,
            } => {
                registry.set_status(&name, &token, status)?;
                Ok(Payload::null())
            }
            Command::GetOperation { name, token } => encode(&registry.operation_for(&name, &token)?),
            Command::Dispatch { name, op } => {
                registry.dispatch(&name, &op)?;
                Ok(Payload::null())
            }
            Command::Disconnect { name, token } => {
                registry.delete(&name, &token)?;
                Ok(Payload::null())
            }
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Payload, DispatchError> {
    Ok(Payload::encode(value)?)
}

#[cfg(test)]
mod tests {
    use labcon_types::{DriverStatus, DriverToken, ErrorCode, Operation};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::registry::{DriverCoordinator, SledDriverRepository};

    #[fixture]
    fn router() -> RegistryRouter {
        let repository = SledDriverRepository::temporary().expect("temporary database");
        RegistryRouter::new(Arc::new(DriverCoordinator::with_random_tokens(repository)))
    }

    fn json(text: &str) -> Payload {
        Payload::parse(text).expect("valid json")
    }

    fn register(router: &RegistryRouter, name: &str) -> DriverToken {
        router
            .route(Command::Register {
                name: name.to_owned(),
                state: json(r#"{"mode":"auto"}"#),
            })
            .expect("register")
            .decode()
            .expect("token")
    }

    #[rstest]
    fn register_returns_a_token_and_state_is_readable(router: RegistryRouter) {
        let token = register(&router, "cam");
        assert!(!token.is_blank());

        let state = router
            .route(Command::GetState {
                name: "cam".to_owned(),
            })
            .expect("get state");
        assert_eq!(state, json(r#"{"mode":"auto"}"#));
    }

    #[rstest]
    fn token_gated_calls_reject_wrong_tokens(router: RegistryRouter) {
        register(&router, "cam");
        let wrong = DriverToken::new("WRONG");

        let commands = [
            Command::SetState {
                name: "cam".to_owned(),
                token: wrong.clone(),
                state: json("1"),
            },
            Command::SetStatus {
                name: "cam".to_owned(),
                token: wrong.clone(),
                status: DriverStatus::Error,
            },
            Command::GetOperation {
                name: "cam".to_owned(),
                token: wrong.clone(),
            },
            Command::Disconnect {
                name: "cam".to_owned(),
                token: wrong,
            },
        ];
        for command in commands {
            let error = router.route(command).expect_err("wrong token");
            assert_eq!(error.code(), ErrorCode::Unauthorized);
        }
        assert_eq!(
            router
                .route(Command::GetState {
                    name: "cam".to_owned()
                })
                .expect("state untouched"),
            json(r#"{"mode":"auto"}"#)
        );
    }

    #[rstest]
    fn dispatch_needs_no_token_and_second_dispatch_is_busy(router: RegistryRouter) {
        let token = register(&router, "cam");
        let dispatch = |name: &str| Command::Dispatch {
            name: "cam".to_owned(),
            op: Operation::new(name),
        };

        router.route(dispatch("scan")).expect("first dispatch");
        let error = router.route(dispatch("park")).expect_err("busy");
        assert_eq!(error.code(), ErrorCode::Busy);

        let op: Option<Operation> = router
            .route(Command::GetOperation {
                name: "cam".to_owned(),
                token,
            })
            .expect("get operation")
            .decode()
            .expect("operation");
        assert_eq!(op, Some(Operation::new("scan")));
    }

    #[rstest]
    fn get_operation_is_null_when_nothing_is_pending(router: RegistryRouter) {
        let token = register(&router, "cam");
        let payload = router
            .route(Command::GetOperation {
                name: "cam".to_owned(),
                token,
            })
            .expect("get operation");
        assert!(payload.is_null());
    }

    #[rstest]
    fn unknown_driver_is_not_found_before_token_check(router: RegistryRouter) {
        let error = router
            .route(Command::SetStatus {
                name: "ghost".to_owned(),
                token: DriverToken::new("ANY"),
                status: DriverStatus::Idle,
            })
            .expect_err("unknown driver");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    fn disconnect_removes_driver_from_listing(router: RegistryRouter) {
        register(&router, "a");
        let token = register(&router, "b");
        router
            .route(Command::Disconnect {
                name: "b".to_owned(),
                token,
            })
            .expect("disconnect");

        let names: Vec<String> = router
            .route(Command::List)
            .expect("list")
            .decode()
            .expect("names");
        assert_eq!(names, vec!["a".to_owned()]);
    }

    #[rstest]
    fn stale_token_is_refused_after_the_name_is_registered_again(router: RegistryRouter) {
        let stale = register(&router, "cam");
        router
            .route(Command::Disconnect {
                name: "cam".to_owned(),
                token: stale.clone(),
            })
            .expect("disconnect");
        register(&router, "cam");

        let error = router
            .route(Command::SetState {
                name: "cam".to_owned(),
                token: stale.clone(),
                state: json(r#""hijacked""#),
            })
            .expect_err("stale token");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        let error = router
            .route(Command::Disconnect {
                name: "cam".to_owned(),
                token: stale,
            })
            .expect_err("stale token");
        assert_eq!(error.code(), ErrorCode::Unauthorized);

        assert_eq!(
            router
                .route(Command::GetState {
                    name: "cam".to_owned()
                })
                .expect("state untouched"),
            json(r#"{"mode":"auto"}"#)
        );
    }

    #[rstest]
    fn duplicate_registration_is_already_exists(router: RegistryRouter) {
        register(&router, "cam");
        let error = router
            .route(Command::Register {
                name: "cam".to_owned(),
                state: json("2"),
            })
            .expect_err("duplicate");
        assert_eq!(error.code(), ErrorCode::AlreadyExists);
    }
}
