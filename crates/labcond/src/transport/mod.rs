//! Socket listener for the daemon's gateway endpoint.
//!
//! The transport binds the configured TCP or Unix endpoint, accepts
//! connections on a background thread, and hands each one to a worker
//! thread so calls against different drivers proceed in parallel.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
