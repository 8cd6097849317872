//! Check-in / check-out for a single user-day.
//!
//! A day moves `NoRecord -> CheckedIn -> CheckedOut`; any other transition is
//! rejected. Writes load the whole record collection, change it and save it
//! back, so they run one at a time behind `write_gate` and only land if the
//! collection is still at the version they read.

use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, SubsecRound, Timelike, Utc};
use futures::lock::Mutex;
use tracing::{info, instrument, warn};

use super::{WRITE_ATTEMPTS, next_id};
use crate::error::{AttendanceError, Result, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::store::{RecordStore, Snapshot};

const LATE_FROM_HOUR: u32 = 9;
const LATE_UNTIL_HOUR: u32 = 12;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// `Late` for a check-in hour in `[9, 12)`, `Present` otherwise.
pub fn status_for_check_in(now: &DateTime<FixedOffset>) -> AttendanceStatus {
    if (LATE_FROM_HOUR..LATE_UNTIL_HOUR).contains(&now.hour()) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// Hours between two timestamps, unrounded.
pub fn worked_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    (check_out - check_in).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

pub struct AttendanceService {
    store: Arc<dyn RecordStore>,
    write_gate: Mutex<()>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_gate: Mutex::new(()),
        }
    }

    /// Applies `change` to the latest records and saves them. The gate keeps
    /// this process to one writer; a save from anywhere else in between
    /// makes the round start over on fresh data.
    async fn update_records<R>(
        &self,
        mut change: impl FnMut(&mut Vec<AttendanceRecord>) -> Result<R>,
    ) -> Result<R> {
        let _guard = self.write_gate.lock().await;

        for attempt in 1..=WRITE_ATTEMPTS {
            let Snapshot {
                items: mut records,
                version,
            } = self.store.records_snapshot().await?;

            let outcome = change(&mut records)?;

            match self.store.replace_records(&records, version).await {
                Ok(()) => return Ok(outcome),
                Err(StoreError::Conflict) => {
                    warn!(attempt, version, "Attendance records changed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Conflict.into())
    }

    #[instrument(name = "attendance_check_in", skip(self))]
    pub async fn check_in(
        &self,
        user_id: u64,
        now: DateTime<FixedOffset>,
    ) -> Result<AttendanceRecord> {
        let today = now.date_naive();

        let record = self
            .update_records(|records| {
                if records
                    .iter()
                    .any(|r| r.user_id == user_id && r.date == today)
                {
                    warn!(user_id, %today, "Check-in rejected: record already exists");
                    return Err(AttendanceError::AlreadyCheckedIn);
                }

                let record = AttendanceRecord {
                    id: next_id(records.iter().map(|r| r.id)),
                    user_id,
                    date: today,
                    check_in_time: Some(now.with_timezone(&Utc).trunc_subsecs(3)),
                    check_out_time: None,
                    status: status_for_check_in(&now),
                    total_hours: None,
                };
                records.push(record.clone());
                Ok(record)
            })
            .await?;

        info!(user_id, %today, status = %record.status, "Checked in");
        Ok(record)
    }

    #[instrument(name = "attendance_check_out", skip(self))]
    pub async fn check_out(
        &self,
        user_id: u64,
        now: DateTime<FixedOffset>,
    ) -> Result<AttendanceRecord> {
        let today = now.date_naive();
        let check_out = now.with_timezone(&Utc).trunc_subsecs(3);

        let updated = self
            .update_records(|records| {
                let record = records
                    .iter_mut()
                    .find(|r| r.user_id == user_id && r.date == today)
                    .ok_or(AttendanceError::NoCheckInFound)?;

                if record.is_checked_out() {
                    warn!(user_id, %today, "Check-out rejected: already checked out");
                    return Err(AttendanceError::AlreadyCheckedOut);
                }

                let check_in = record.check_in_time.ok_or(AttendanceError::NoCheckInFound)?;
                if check_out <= check_in {
                    warn!(
                        user_id,
                        %check_in,
                        %check_out,
                        "Check-out rejected: clock went backwards"
                    );
                    return Err(AttendanceError::CheckOutBeforeCheckIn);
                }

                record.check_out_time = Some(check_out);
                record.total_hours = Some(worked_hours(check_in, check_out));
                Ok(record.clone())
            })
            .await?;

        info!(user_id, %today, total_hours = updated.hours(), "Checked out");
        Ok(updated)
    }

    pub async fn get_today(
        &self,
        user_id: u64,
        now: DateTime<FixedOffset>,
    ) -> Result<Option<AttendanceRecord>> {
        let today = now.date_naive();
        let records = self.store.load_records().await?;

        Ok(records
            .into_iter()
            .find(|r| r.user_id == user_id && r.date == today))
    }

    /// Newest first. Without month and year the whole history is returned;
    /// a single missing part falls back to `today`'s.
    pub async fn get_history(
        &self,
        user_id: u64,
        month: Option<u32>,
        year: Option<i32>,
        today: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let period = match (month, year) {
            (None, None) => None,
            (month, year) => Some(super::aggregation::resolve_period(month, year, today)?),
        };

        let mut history: Vec<_> = self
            .store
            .load_records()
            .await?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| period.is_none_or(|(m, y)| r.date.month() == m && r.date.year() == y))
            .collect();

        history.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(history)
    }
}
