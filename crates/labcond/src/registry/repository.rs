//! Driver persistence on top of the embedded `sled` store.
//!
//! One entry is stored per driver under `driver/<name>`, holding the JSON
//! encoded [`DriverRecord`]. Every write path runs inside a `sled`
//! transaction so that existence checks, validation, and writes on one key
//! are serialised against concurrent callers.

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionalTree, abort};
use sled::{Db, IVec};

use labcon_types::{DriverToken, Payload};

use super::errors::RegistryError;
use super::record::DriverRecord;

/// Key namespace for driver records.
pub const DRIVER_PREFIX: &[u8] = b"driver/";

/// Edit applied to a record inside a storage transaction.
///
/// The engine may run the mutation more than once when it detects a
/// conflicting transaction, so it must only edit the record it is given.
pub type Mutation<'a> = &'a dyn Fn(&mut DriverRecord) -> Result<(), RegistryError>;

/// Precondition checked against a record inside a storage transaction.
pub type Guard<'a> = &'a dyn Fn(&DriverRecord) -> Result<(), RegistryError>;

/// Raw CRUD over driver records plus a transactional read-modify-write.
pub trait DriverRepository: Send + Sync {
    /// Persists a new idle record, failing if the name is taken.
    fn create(&self, name: &str, token: &DriverToken, state: &Payload)
    -> Result<(), RegistryError>;

    /// Reads the record stored under `name`.
    fn fetch(&self, name: &str) -> Result<DriverRecord, RegistryError>;

    /// Overwrites the stored record unconditionally.
    fn update(&self, record: &DriverRecord) -> Result<(), RegistryError>;

    /// Reads, edits, and writes back one record as a single transaction,
    /// returning the record as written.
    fn modify(&self, name: &str, mutation: Mutation<'_>) -> Result<DriverRecord, RegistryError>;

    /// Removes the record stored under `name`.
    fn delete(&self, name: &str) -> Result<(), RegistryError> {
        self.delete_checked(name, &|_| Ok(()))
    }

    /// Removes the record stored under `name` if `guard` accepts it. The read,
    /// the check, and the removal commit as one transaction.
    fn delete_checked(&self, name: &str, guard: Guard<'_>) -> Result<(), RegistryError>;

    /// Returns the registered names in key order.
    fn list(&self) -> Result<Vec<String>, RegistryError>;
}

/// [`DriverRepository`] backed by a `sled` database.
#[derive(Debug, Clone)]
pub struct SledDriverRepository {
    db: Db,
}

impl SledDriverRepository {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns the engine error when the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        Ok(Self::from_db(sled::open(path)?))
    }

    /// Opens a throwaway database that is removed when dropped.
    ///
    /// # Errors
    ///
    /// Returns the engine error when the database cannot be created.
    pub fn temporary() -> Result<Self, RegistryError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    /// Wraps an already opened database.
    #[must_use]
    pub fn from_db(db: Db) -> Self {
        Self { db }
    }

    /// Flushes dirty pages to disk.
    ///
    /// # Errors
    ///
    /// Returns the engine error when the flush fails.
    pub fn flush(&self) -> Result<(), RegistryError> {
        self.db.flush()?;
        Ok(())
    }

    fn key(name: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(DRIVER_PREFIX.len() + name.len());
        key.extend_from_slice(DRIVER_PREFIX);
        key.extend_from_slice(name.as_bytes());
        key
    }

    fn encode(record: &DriverRecord) -> Result<Vec<u8>, RegistryError> {
        record
            .encode()
            .map_err(|source| RegistryError::codec(&record.name, source))
    }

    fn decode(name: &str, bytes: &IVec) -> Result<DriverRecord, RegistryError> {
        DriverRecord::decode(bytes).map_err(|source| RegistryError::codec(name, source))
    }
}

fn read_in(
    tx: &TransactionalTree,
    name: &str,
    key: &[u8],
) -> Result<DriverRecord, ConflictableTransactionError<RegistryError>> {
    match tx.get(key)? {
        Some(bytes) => {
            SledDriverRepository::decode(name, &bytes).map_err(ConflictableTransactionError::Abort)
        }
        None => Err(ConflictableTransactionError::Abort(
            RegistryError::not_found(name),
        )),
    }
}

impl DriverRepository for SledDriverRepository {
    fn create(
        &self,
        name: &str,
        token: &DriverToken,
        state: &Payload,
    ) -> Result<(), RegistryError> {
        let key = Self::key(name);
        let value = Self::encode(&DriverRecord::registered(
            name,
            token.clone(),
            state.clone(),
        ))?;
        self.db.transaction(|tx| {
            if tx.get(key.as_slice())?.is_some() {
                return abort(RegistryError::already_exists(name));
            }
            tx.insert(key.as_slice(), value.as_slice())?;
            Ok(())
        })?;
        Ok(())
    }

    fn fetch(&self, name: &str) -> Result<DriverRecord, RegistryError> {
        match self.db.get(Self::key(name))? {
            Some(bytes) => Self::decode(name, &bytes),
            None => Err(RegistryError::not_found(name)),
        }
    }

    fn update(&self, record: &DriverRecord) -> Result<(), RegistryError> {
        let value = Self::encode(record)?;
        self.db.insert(Self::key(&record.name), value)?;
        Ok(())
    }

    fn modify(&self, name: &str, mutation: Mutation<'_>) -> Result<DriverRecord, RegistryError> {
        let key = Self::key(name);
        let record = self.db.transaction(|tx| {
            let mut record = read_in(tx, name, &key)?;
            mutation(&mut record).map_err(ConflictableTransactionError::Abort)?;
            let value = Self::encode(&record).map_err(ConflictableTransactionError::Abort)?;
            tx.insert(key.as_slice(), value)?;
            Ok(record)
        })?;
        Ok(record)
    }

    fn delete_checked(&self, name: &str, guard: Guard<'_>) -> Result<(), RegistryError> {
        let key = Self::key(name);
        self.db.transaction(|tx| {
            let record = read_in(tx, name, &key)?;
            guard(&record).map_err(ConflictableTransactionError::Abort)?;
            tx.remove(key.as_slice())?;
            Ok(())
        })?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, RegistryError> {
        self.db
            .scan_prefix(DRIVER_PREFIX)
            .keys()
            .map(|key| {
                let key = key?;
                let name = key.get(DRIVER_PREFIX.len()..).unwrap_or_default();
                Ok(String::from_utf8_lossy(name).into_owned())
            })
            .collect()
    }
}
