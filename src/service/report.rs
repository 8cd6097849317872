use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{AttendanceError, Result};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    user::User,
};
use crate::store::RecordStore;

const CSV_HEADER: [&str; 8] = [
    "Employee ID",
    "Name",
    "Department",
    "Date",
    "Check In",
    "Check Out",
    "Status",
    "Total Hours",
];

const EMPLOYEE_ATTENDANCE_LIMIT: usize = 30;

/// Conjunctive filter; `None` fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub date: Option<NaiveDate>,
    /// Inclusive on both ends.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub status: Option<AttendanceStatus>,
    pub user_id: Option<u64>,
}

impl ReportFilter {
    fn matches(&self, record: &AttendanceRecord) -> bool {
        self.date.is_none_or(|d| record.date == d)
            && self
                .date_range
                .is_none_or(|(start, end)| start <= record.date && record.date <= end)
            && self.status.is_none_or(|s| record.status == s)
            && self.user_id.is_none_or(|id| record.user_id == id)
    }
}

/// A record with its owner's fields copied in. Unknown owners leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct JoinedRecord {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub total_hours: Option<f64>,
    pub name: String,
    pub email: String,
    pub employee_code: String,
    pub department: String,
}

impl JoinedRecord {
    fn join(record: &AttendanceRecord, owner: Option<&User>) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            date: record.date,
            check_in_time: record.check_in_time,
            check_out_time: record.check_out_time,
            status: record.status,
            total_hours: record.total_hours,
            name: owner.map(|u| u.name.clone()).unwrap_or_default(),
            email: owner.map(|u| u.email.clone()).unwrap_or_default(),
            employee_code: owner.map(|u| u.employee_code.clone()).unwrap_or_default(),
            department: owner.map(|u| u.department.clone()).unwrap_or_default(),
        }
    }
}

/// Matching records joined with their owners, newest date first.
pub fn filter_records(
    users: &[User],
    records: &[AttendanceRecord],
    filter: &ReportFilter,
) -> Vec<JoinedRecord> {
    let mut rows: Vec<JoinedRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| JoinedRecord::join(r, users.iter().find(|u| u.id == r.user_id)))
        .collect();

    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

fn timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn csv_failure(e: impl std::fmt::Display) -> AttendanceError {
    AttendanceError::Internal(format!("CSV export failed: {e}"))
}

/// Header plus one line per row, columns in `CSV_HEADER` order.
pub fn to_csv(rows: &[JoinedRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_failure)?;

    for row in rows {
        writer
            .write_record([
                row.employee_code.clone(),
                row.name.clone(),
                row.department.clone(),
                row.date.format("%Y-%m-%d").to_string(),
                timestamp(row.check_in_time),
                timestamp(row.check_out_time),
                row.status.to_string(),
                row.total_hours.unwrap_or(0.0).to_string(),
            ])
            .map_err(csv_failure)?;
    }

    let bytes = writer.into_inner().map_err(csv_failure)?;
    String::from_utf8(bytes).map_err(csv_failure)
}

pub struct ReportService {
    store: Arc<dyn RecordStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn filter_records(&self, filter: &ReportFilter) -> Result<Vec<JoinedRecord>> {
        let users = self.store.load_users().await?;
        let records = self.store.load_records().await?;
        Ok(filter_records(&users, &records, filter))
    }

    pub async fn export_csv(&self, filter: &ReportFilter) -> Result<String> {
        let rows = self.filter_records(filter).await?;
        debug!(rows = rows.len(), "Exporting attendance CSV");
        to_csv(&rows)
    }

    /// The most recent records of one employee.
    pub async fn employee_attendance(
        &self,
        user_id: u64,
        date_range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<JoinedRecord>> {
        let filter = ReportFilter {
            user_id: Some(user_id),
            date_range,
            ..ReportFilter::default()
        };
        let mut rows = self.filter_records(&filter).await?;
        rows.truncate(EMPLOYEE_ATTENDANCE_LIMIT);
        Ok(rows)
    }
}
