//! JSONL gateway between socket clients and the driver registry.
//!
//! Each connection carries one request line and receives one reply line.
//!
//! ```json
//! {"operation":"set-status","name":"spectrometer","token":"…","status":"idle"}
//! {"ok":null}
//! ```
//!
//! Requests are validated before the registry sees them. Registry outcomes
//! map to stable error codes (`not_found`, `unauthorized`, `already_exists`,
//! `busy`, `bad_request`, `internal`) with HTTP-style numeric statuses.

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::errors::DispatchError;
pub(crate) use self::handler::DispatchConnectionHandler;
pub(crate) use self::request::Command;
pub(crate) use self::router::RegistryRouter;
