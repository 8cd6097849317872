use std::sync::RwLock;

use async_trait::async_trait;

use super::{RecordStore, Snapshot};
use crate::error::StoreError;
use crate::model::{attendance::AttendanceRecord, user::User};

/// Process-local store. Used when no database is configured and by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Snapshot<User>>,
    records: RwLock<Snapshot<AttendanceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_data(users: Vec<User>, records: Vec<AttendanceRecord>) -> Self {
        Self {
            users: RwLock::new(Snapshot {
                items: users,
                version: 0,
            }),
            records: RwLock::new(Snapshot {
                items: records,
                version: 0,
            }),
        }
    }
}

fn read<T: Clone>(collection: &RwLock<Snapshot<T>>) -> Result<Snapshot<T>, StoreError> {
    let snapshot = collection.read().map_err(|_| StoreError::Poisoned)?;
    Ok(snapshot.clone())
}

/// Swaps the items in and bumps the version. With `expected` set, refuses
/// when the collection has moved past it.
fn write<T: Clone>(
    collection: &RwLock<Snapshot<T>>,
    items: &[T],
    expected: Option<u64>,
) -> Result<(), StoreError> {
    let mut guard = collection.write().map_err(|_| StoreError::Poisoned)?;
    if expected.is_some_and(|version| version != guard.version) {
        return Err(StoreError::Conflict);
    }

    guard.items = items.to_vec();
    guard.version += 1;
    Ok(())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn users_snapshot(&self) -> Result<Snapshot<User>, StoreError> {
        read(&self.users)
    }

    async fn replace_users(
        &self,
        users: &[User],
        expected_version: u64,
    ) -> Result<(), StoreError> {
        write(&self.users, users, Some(expected_version))
    }

    async fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        write(&self.users, users, None)
    }

    async fn records_snapshot(&self) -> Result<Snapshot<AttendanceRecord>, StoreError> {
        read(&self.records)
    }

    async fn replace_records(
        &self,
        records: &[AttendanceRecord],
        expected_version: u64,
    ) -> Result<(), StoreError> {
        write(&self.records, records, Some(expected_version))
    }

    async fn save_records(&self, records: &[AttendanceRecord]) -> Result<(), StoreError> {
        write(&self.records, records, None)
    }
}
