//! Wire-level types shared by the lab controller daemon and its clients.
//!
//! Drivers and control clients exchange single-line JSON messages with the
//! daemon. The types here describe both the driver model exposed to callers
//! (status, pending operations, opaque payloads, tokens) and the request and
//! reply envelopes that carry them.

mod driver;
mod payload;
mod protocol;

pub use driver::{DriverStatus, DriverToken, Operation};
pub use payload::Payload;
pub use protocol::{ErrorCode, ErrorReply, Reply, Request, RequestKind};
