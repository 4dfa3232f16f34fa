//! Driver registry: persistence, token issue, and the lifecycle rules.

mod coordinator;
mod errors;
mod record;
mod repository;
mod token;

pub use coordinator::DriverCoordinator;
pub(crate) use coordinator::REGISTRY_TARGET;
pub use errors::RegistryError;
pub use record::DriverRecord;
pub use repository::{DRIVER_PREFIX, DriverRepository, Guard, Mutation, SledDriverRepository};
pub use token::{RandomTokenGenerator, TOKEN_BYTES, TokenGenerator};

/// Coordinator wired to the daemon's production collaborators.
pub type SharedCoordinator = DriverCoordinator<SledDriverRepository, RandomTokenGenerator>;
