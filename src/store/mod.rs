//! Persistence for the two collections the core works on.
//!
//! Every `save_*` replaces its whole collection. Implementations must make a
//! save atomic with respect to concurrent loads; they do not check any record
//! invariants, that is left to the services.
//!
//! Each collection carries a version that every save bumps. Writers that read
//! a [`Snapshot`] and write back through `replace_*` are refused with
//! [`StoreError::Conflict`] when someone else saved in between, including
//! another process sharing the same database.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{attendance::AttendanceRecord, user::User};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// A collection as it was at `version`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub version: u64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            version: 0,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn users_snapshot(&self) -> Result<Snapshot<User>, StoreError>;

    /// Replaces the users unless they were saved after `expected_version`.
    async fn replace_users(
        &self,
        users: &[User],
        expected_version: u64,
    ) -> Result<(), StoreError>;

    async fn save_users(&self, users: &[User]) -> Result<(), StoreError>;

    async fn records_snapshot(&self) -> Result<Snapshot<AttendanceRecord>, StoreError>;

    /// Replaces the records unless they were saved after `expected_version`.
    async fn replace_records(
        &self,
        records: &[AttendanceRecord],
        expected_version: u64,
    ) -> Result<(), StoreError>;

    async fn save_records(&self, records: &[AttendanceRecord]) -> Result<(), StoreError>;

    async fn load_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users_snapshot().await?.items)
    }

    async fn load_records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.records_snapshot().await?.items)
    }
}
