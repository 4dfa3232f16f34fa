//! Driver lifecycle state machine and the single-flight dispatch gate.
//!
//! The coordinator owns every rule that spans more than one field of a
//! [`DriverRecord`]: token checks, the "status write clears the pending
//! operation" rule, and the idle-and-empty precondition on dispatch. Each
//! mutating call funnels through [`DriverRepository::modify`] (or
//! [`DriverRepository::delete_checked`]) so the read, the token check, and
//! the write commit together.

use tracing::{debug, info};

use labcon_types::{DriverStatus, DriverToken, Operation, Payload};

use super::errors::RegistryError;
use super::record::DriverRecord;
use super::repository::DriverRepository;
use super::token::{RandomTokenGenerator, TokenGenerator};

/// Tracing target for registry events.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Registry front door used by the gateway.
///
/// Collaborators are supplied at construction; the coordinator itself holds
/// no locks and relies on storage transactions for per-driver ordering.
#[derive(Debug)]
pub struct DriverCoordinator<R, G = RandomTokenGenerator> {
    repository: R,
    tokens: G,
}

impl<R> DriverCoordinator<R>
where
    R: DriverRepository,
{
    /// Builds a coordinator issuing tokens from the system CSPRNG.
    pub fn with_random_tokens(repository: R) -> Self {
        Self::new(repository, RandomTokenGenerator)
    }
}

impl<R, G> DriverCoordinator<R, G>
where
    R: DriverRepository,
    G: TokenGenerator,
{
    /// Builds a coordinator from its repository and token source.
    pub fn new(repository: R, tokens: G) -> Self {
        Self { repository, tokens }
    }

    /// Names of every registered driver, in storage key order.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the scan fails.
    pub fn list(&self) -> Result<Vec<String>, RegistryError> {
        self.repository.list()
    }

    /// Registers a new idle driver and returns its freshly minted token.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyExists`] when the name is taken; the
    /// existing record is left untouched.
    pub fn register(&self, name: &str, state: &Payload) -> Result<DriverToken, RegistryError> {
        let token = self.tokens.generate();
        self.repository.create(name, &token, state)?;
        info!(target: REGISTRY_TARGET, driver = name, "driver registered");
        Ok(token)
    }

    /// Checks `token` against the token issued at registration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers and
    /// [`RegistryError::Unauthorized`] on mismatch.
    pub fn authorize(&self, name: &str, token: &DriverToken) -> Result<(), RegistryError> {
        let record = self.repository.fetch(name)?;
        logged(name, check_token(&record, token))
    }

    /// Current application state of the driver.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers.
    pub fn get_state(&self, name: &str) -> Result<Payload, RegistryError> {
        Ok(self.repository.fetch(name)?.state)
    }

    /// Replaces the driver's state wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers and
    /// [`RegistryError::Unauthorized`] when `token` does not match.
    pub fn set_state(
        &self,
        name: &str,
        token: &DriverToken,
        state: &Payload,
    ) -> Result<(), RegistryError> {
        let written = self.repository.modify(name, &|record| {
            check_token(record, token)?;
            record.state = state.clone();
            Ok(())
        });
        logged(name, written)?;
        debug!(target: REGISTRY_TARGET, driver = name, "state replaced");
        Ok(())
    }

    /// Current lifecycle status of the driver.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers.
    pub fn get_status(&self, name: &str) -> Result<DriverStatus, RegistryError> {
        Ok(self.repository.fetch(name)?.status)
    }

    /// Writes the status and drops any pending operation in the same
    /// transaction, whatever the new status is.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers and
    /// [`RegistryError::Unauthorized`] when `token` does not match.
    pub fn set_status(
        &self,
        name: &str,
        token: &DriverToken,
        status: DriverStatus,
    ) -> Result<(), RegistryError> {
        let written = self.repository.modify(name, &|record| {
            check_token(record, token)?;
            record.status = status;
            record.op = None;
            Ok(())
        });
        logged(name, written)?;
        info!(target: REGISTRY_TARGET, driver = name, %status, "status changed");
        Ok(())
    }

    /// Operation currently waiting for the driver, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers.
    pub fn get_op(&self, name: &str) -> Result<Option<Operation>, RegistryError> {
        Ok(self.repository.fetch(name)?.op)
    }

    /// Pending operation read on the driver's behalf. The token is checked
    /// against the same record the operation is read from.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers and
    /// [`RegistryError::Unauthorized`] when `token` does not match.
    pub fn operation_for(
        &self,
        name: &str,
        token: &DriverToken,
    ) -> Result<Option<Operation>, RegistryError> {
        let record = self.repository.fetch(name)?;
        logged(name, check_token(&record, token))?;
        Ok(record.op)
    }

    /// Hands `op` to an idle driver and marks it busy.
    ///
    /// At most one dispatch can win against a given idle driver; every
    /// concurrent competitor observes the winner's write and is refused.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers and
    /// [`RegistryError::Busy`] when the driver is not idle or still has an
    /// operation pending.
    pub fn dispatch(&self, name: &str, op: &Operation) -> Result<(), RegistryError> {
        self.repository
            .modify(name, &|record| install_operation(record, op))?;
        info!(
            target: REGISTRY_TARGET,
            driver = name,
            operation = op.name.as_str(),
            "operation dispatched"
        );
        Ok(())
    }

    /// Removes the driver permanently.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown drivers and
    /// [`RegistryError::Unauthorized`] when `token` does not match.
    pub fn delete(&self, name: &str, token: &DriverToken) -> Result<(), RegistryError> {
        let removed = self
            .repository
            .delete_checked(name, &|record| check_token(record, token));
        logged(name, removed)?;
        info!(target: REGISTRY_TARGET, driver = name, "driver removed");
        Ok(())
    }
}

fn check_token(record: &DriverRecord, token: &DriverToken) -> Result<(), RegistryError> {
    if record.token == *token {
        Ok(())
    } else {
        Err(RegistryError::unauthorized(&record.name))
    }
}

fn logged<T>(name: &str, result: Result<T, RegistryError>) -> Result<T, RegistryError> {
    if let Err(RegistryError::Unauthorized { .. }) = &result {
        debug!(target: REGISTRY_TARGET, driver = name, "token rejected");
    }
    result
}

fn install_operation(record: &mut DriverRecord, op: &Operation) -> Result<(), RegistryError> {
    if !record.accepts_dispatch() {
        return Err(RegistryError::busy(&record.name));
    }
    record.status = DriverStatus::Busy;
    record.op = Some(op.clone());
    Ok(())
}
