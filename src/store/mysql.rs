use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use tracing::debug;

use super::{RecordStore, Snapshot};
use crate::error::StoreError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    role::Role,
    user::User,
};

/// MySQL-backed store. Tables are described in `schema.sql`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: u64, // BIGINT UNSIGNED
    name: String,
    email: String,
    password_hash: String,
    role: String,
    employee_code: String,
    department: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::Corrupt(format!("user {} has role {:?}", row.id, row.role)))?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            employee_code: row.employee_code,
            department: row.department,
            password_hash: row.password_hash,
        })
    }
}

#[derive(FromRow)]
struct RecordRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    status: String,
    total_hours: Option<f64>,
}

impl TryFrom<RecordRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| {
            StoreError::Corrupt(format!("record {} has status {:?}", row.id, row.status))
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            status,
            total_hours: row.total_hours,
        })
    }
}

const USERS: &str = "users";
const RECORDS: &str = "attendance_records";

async fn read_version(conn: &mut MySqlConnection, collection: &str) -> Result<u64, StoreError> {
    sqlx::query_scalar::<_, u64>("SELECT version FROM collection_versions WHERE name = ?")
        .bind(collection)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StoreError::Corrupt(format!("no version row for {collection}")))
}

/// Bumps the version, or refuses when it no longer equals `expected`. The
/// row lock taken here is held until commit, so concurrent writers queue.
async fn bump_version(
    conn: &mut MySqlConnection,
    collection: &str,
    expected: Option<u64>,
) -> Result<(), StoreError> {
    let result = match expected {
        Some(version) => {
            sqlx::query(
                r#"
                UPDATE collection_versions
                SET version = version + 1
                WHERE name = ? AND version = ?
                "#,
            )
            .bind(collection)
            .bind(version)
            .execute(&mut *conn)
            .await?
        }
        None => {
            sqlx::query("UPDATE collection_versions SET version = version + 1 WHERE name = ?")
                .bind(collection)
                .execute(&mut *conn)
                .await?
        }
    };

    match (result.rows_affected(), expected) {
        (0, Some(_)) => Err(StoreError::Conflict),
        (0, None) => Err(StoreError::Corrupt(format!("no version row for {collection}"))),
        _ => Ok(()),
    }
}

impl MySqlStore {
    async fn write_users(&self, users: &[User], expected: Option<u64>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        bump_version(&mut tx, USERS, expected).await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;

        for user in users {
            sqlx::query(
                r#"
                INSERT INTO users
                    (id, name, email, password_hash, role, employee_code, department)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.to_string())
            .bind(&user.employee_code)
            .bind(&user.department)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(count = users.len(), "Users collection replaced");
        Ok(())
    }

    async fn write_records(
        &self,
        records: &[AttendanceRecord],
        expected: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        bump_version(&mut tx, RECORDS, expected).await?;
        sqlx::query("DELETE FROM attendance_records")
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO attendance_records
                    (id, user_id, date, check_in_time, check_out_time, status, total_hours)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.id)
            .bind(record.user_id)
            .bind(record.date)
            .bind(record.check_in_time)
            .bind(record.check_out_time)
            .bind(record.status.to_string())
            .bind(record.total_hours)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(count = records.len(), "Attendance collection replaced");
        Ok(())
    }
}

// Snapshots read the version and the rows in one transaction, so InnoDB's
// consistent read gives both from the same point in time.
#[async_trait]
impl RecordStore for MySqlStore {
    async fn users_snapshot(&self) -> Result<Snapshot<User>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let version = read_version(&mut tx, USERS).await?;
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, employee_code, department
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Snapshot {
            items: rows
                .into_iter()
                .map(User::try_from)
                .collect::<Result<_, _>>()?,
            version,
        })
    }

    async fn replace_users(
        &self,
        users: &[User],
        expected_version: u64,
    ) -> Result<(), StoreError> {
        self.write_users(users, Some(expected_version)).await
    }

    async fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        self.write_users(users, None).await
    }

    async fn records_snapshot(&self) -> Result<Snapshot<AttendanceRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let version = read_version(&mut tx, RECORDS).await?;
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
            FROM attendance_records
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Snapshot {
            items: rows
                .into_iter()
                .map(AttendanceRecord::try_from)
                .collect::<Result<_, _>>()?,
            version,
        })
    }

    async fn replace_records(
        &self,
        records: &[AttendanceRecord],
        expected_version: u64,
    ) -> Result<(), StoreError> {
        self.write_records(records, Some(expected_version)).await
    }

    async fn save_records(&self, records: &[AttendanceRecord]) -> Result<(), StoreError> {
        self.write_records(records, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_reported_as_corrupt() {
        let row = RecordRow {
            id: 9,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            check_in_time: None,
            check_out_time: None,
            status: "on-leave".into(),
            total_hours: None,
        };

        let err = AttendanceRecord::try_from(row).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn user_row_maps_role() {
        let row = UserRow {
            id: 2,
            name: "Grace".into(),
            email: "grace@company.com".into(),
            password_hash: "hash".into(),
            role: "manager".into(),
            employee_code: "EMP001".into(),
            department: "Ops".into(),
        };

        let user = User::try_from(row).unwrap();
        assert_eq!(user.role, Role::Manager);
        assert_eq!(user.password_hash, "hash");
    }
}
