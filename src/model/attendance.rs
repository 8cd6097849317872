use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Day status. Check-in only ever assigns `Present` or `Late`; the other two
/// variants are kept so a later rule can produce them without a type change.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    HalfDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 1,
    "date": "2026-10-19",
    "check_in_time": "2026-10-19T09:30:00Z",
    "check_out_time": "2026-10-19T17:30:00Z",
    "status": "late",
    "total_hours": 8.0
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    /// Set together with `check_out_time`.
    pub total_hours: Option<f64>,
}

impl AttendanceRecord {
    pub fn is_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }

    pub fn hours(&self) -> f64 {
        self.total_hours.unwrap_or(0.0)
    }
}
