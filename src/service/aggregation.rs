//! Read-side summaries over the full user and record collections.
//!
//! Three different notions of "absent" live here and are kept apart on
//! purpose:
//! - monthly summaries always report `absent = 0`,
//! - the today roster counts employees without a record today,
//! - the manager dashboard subtracts today's record count from the number of
//!   employees, so records of non-employees push it down (even below zero).

use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AttendanceError, Result};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    user::User,
};
use crate::store::RecordStore;

const RECENT_RECORDS: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct MonthlySummary {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub half_day: usize,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TeamMemberSummary {
    pub id: u64,
    pub name: String,
    pub employee_code: String,
    pub department: String,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub half_day: usize,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RosterEntry {
    pub id: u64,
    pub name: String,
    pub employee_code: String,
    pub department: String,
    pub status: Option<AttendanceStatus>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TodayRoster {
    #[schema(value_type = String, format = "date")]
    pub today: NaiveDate,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub employees: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayCounts {
    pub present: usize,
    pub absent: i64,
    pub late: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ManagerDashboard {
    pub total_employees: usize,
    pub today_stats: DayCounts,
    pub absent_today: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeDashboard {
    pub today_attendance: Option<AttendanceRecord>,
    pub monthly_stats: MonthlySummary,
    pub recent_attendance: Vec<AttendanceRecord>,
}

/// Fills a missing month or year from `today`.
pub fn resolve_period(
    month: Option<u32>,
    year: Option<i32>,
    today: NaiveDate,
) -> Result<(u32, i32)> {
    let month = month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(AttendanceError::InvalidPeriod(month));
    }
    Ok((month, year.unwrap_or_else(|| today.year())))
}

fn in_month(record: &AttendanceRecord, month: u32, year: i32) -> bool {
    record.date.month() == month && record.date.year() == year
}

fn summarize<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> MonthlySummary {
    records
        .into_iter()
        .fold(MonthlySummary::default(), |mut summary, record| {
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Late => summary.late += 1,
                AttendanceStatus::HalfDay => summary.half_day += 1,
                // Never counted from records, see module docs.
                AttendanceStatus::Absent => {}
            }
            summary.total_hours += record.hours();
            summary
        })
}

pub fn monthly_summary(
    records: &[AttendanceRecord],
    user_id: u64,
    month: u32,
    year: i32,
) -> MonthlySummary {
    summarize(
        records
            .iter()
            .filter(|r| r.user_id == user_id && in_month(r, month, year)),
    )
}

/// One entry per employee, in user listing order.
pub fn team_monthly_summary(
    users: &[User],
    records: &[AttendanceRecord],
    month: u32,
    year: i32,
) -> Vec<TeamMemberSummary> {
    users
        .iter()
        .filter(|u| u.is_employee())
        .map(|user| {
            let summary = monthly_summary(records, user.id, month, year);
            TeamMemberSummary {
                id: user.id,
                name: user.name.clone(),
                employee_code: user.employee_code.clone(),
                department: user.department.clone(),
                present: summary.present,
                absent: summary.absent,
                late: summary.late,
                half_day: summary.half_day,
                total_hours: summary.total_hours,
            }
        })
        .collect()
}

pub fn today_roster(users: &[User], records: &[AttendanceRecord], today: NaiveDate) -> TodayRoster {
    let employees: Vec<RosterEntry> = users
        .iter()
        .filter(|u| u.is_employee())
        .map(|user| {
            let record = records
                .iter()
                .find(|r| r.user_id == user.id && r.date == today);
            RosterEntry {
                id: user.id,
                name: user.name.clone(),
                employee_code: user.employee_code.clone(),
                department: user.department.clone(),
                status: record.map(|r| r.status),
                check_in_time: record.and_then(|r| r.check_in_time),
                check_out_time: record.and_then(|r| r.check_out_time),
            }
        })
        .collect();

    let count = |pred: fn(Option<AttendanceStatus>) -> bool| {
        employees.iter().filter(|e| pred(e.status)).count()
    };

    TodayRoster {
        today,
        present: count(|s| matches!(s, Some(AttendanceStatus::Present | AttendanceStatus::Late))),
        absent: count(|s| s.is_none()),
        late: count(|s| s == Some(AttendanceStatus::Late)),
        employees,
    }
}

pub fn manager_dashboard_totals(
    users: &[User],
    records: &[AttendanceRecord],
    today: NaiveDate,
) -> ManagerDashboard {
    let employees: Vec<&User> = users.iter().filter(|u| u.is_employee()).collect();
    let records_today: Vec<&AttendanceRecord> =
        records.iter().filter(|r| r.date == today).collect();

    let present = records_today
        .iter()
        .filter(|r| matches!(r.status, AttendanceStatus::Present | AttendanceStatus::Late))
        .count();
    let late = records_today
        .iter()
        .filter(|r| r.status == AttendanceStatus::Late)
        .count();

    let absent_today = employees
        .iter()
        .filter(|u| !records_today.iter().any(|r| r.user_id == u.id))
        .map(|u| (*u).clone())
        .collect();

    ManagerDashboard {
        total_employees: employees.len(),
        today_stats: DayCounts {
            present,
            absent: employees.len() as i64 - records_today.len() as i64,
            late,
        },
        absent_today,
    }
}

/// Month-to-date means records dated on or after the first of `today`'s month.
pub fn employee_dashboard(
    records: &[AttendanceRecord],
    user_id: u64,
    today: NaiveDate,
) -> EmployeeDashboard {
    let first_of_month = today.with_day(1).unwrap_or(today);

    let mut own: Vec<&AttendanceRecord> = records.iter().filter(|r| r.user_id == user_id).collect();
    own.sort_by(|a, b| b.date.cmp(&a.date));

    EmployeeDashboard {
        today_attendance: own.iter().find(|r| r.date == today).map(|r| (*r).clone()),
        monthly_stats: summarize(own.iter().copied().filter(|r| r.date >= first_of_month)),
        recent_attendance: own
            .iter()
            .take(RECENT_RECORDS)
            .map(|r| (*r).clone())
            .collect(),
    }
}

/// Store-backed entry points. `now` supplies today and the default period.
pub struct AggregationService {
    store: Arc<dyn RecordStore>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn monthly_summary(
        &self,
        user_id: u64,
        month: Option<u32>,
        year: Option<i32>,
        now: DateTime<FixedOffset>,
    ) -> Result<MonthlySummary> {
        let (month, year) = resolve_period(month, year, now.date_naive())?;
        let records = self.store.load_records().await?;
        Ok(monthly_summary(&records, user_id, month, year))
    }

    pub async fn team_monthly_summary(
        &self,
        month: Option<u32>,
        year: Option<i32>,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<TeamMemberSummary>> {
        let (month, year) = resolve_period(month, year, now.date_naive())?;
        let users = self.store.load_users().await?;
        let records = self.store.load_records().await?;
        Ok(team_monthly_summary(&users, &records, month, year))
    }

    pub async fn today_roster(&self, now: DateTime<FixedOffset>) -> Result<TodayRoster> {
        let users = self.store.load_users().await?;
        let records = self.store.load_records().await?;
        Ok(today_roster(&users, &records, now.date_naive()))
    }

    pub async fn manager_dashboard(&self, now: DateTime<FixedOffset>) -> Result<ManagerDashboard> {
        let users = self.store.load_users().await?;
        let records = self.store.load_records().await?;
        Ok(manager_dashboard_totals(&users, &records, now.date_naive()))
    }

    pub async fn employee_dashboard(
        &self,
        user_id: u64,
        now: DateTime<FixedOffset>,
    ) -> Result<EmployeeDashboard> {
        let records = self.store.load_records().await?;
        Ok(employee_dashboard(&records, user_id, now.date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn user(id: u64, role: Role) -> User {
        User {
            id,
            name: format!("user{id}"),
            email: format!("user{id}@company.com"),
            role,
            employee_code: format!("EMP{id:03}"),
            department: "Engineering".into(),
            password_hash: String::new(),
        }
    }

    fn ymd(year: i32, month: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
    }

    fn record(
        id: u64,
        user_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
        hours: Option<f64>,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id,
            user_id,
            date,
            check_in_time: Some(at(date, 8)),
            check_out_time: hours.map(|_| at(date, 16)),
            status,
            total_hours: hours,
        }
    }

    #[test]
    fn missing_month_and_year_default_to_today() {
        assert_eq!(resolve_period(None, None, day(19)).unwrap(), (10, 2026));
        assert_eq!(resolve_period(Some(3), None, day(19)).unwrap(), (3, 2026));
        assert!(matches!(
            resolve_period(Some(13), Some(2026), day(19)),
            Err(AttendanceError::InvalidPeriod(13))
        ));
    }

    #[test]
    fn monthly_summary_counts_statuses_and_sums_hours() {
        let records = vec![
            record(1, 1, day(1), AttendanceStatus::Present, Some(8.0)),
            record(2, 1, day(2), AttendanceStatus::Late, Some(6.5)),
            record(3, 1, day(3), AttendanceStatus::Late, None),
            record(4, 1, day(4), AttendanceStatus::HalfDay, Some(4.0)),
            record(5, 1, ymd(2026, 9, 30), AttendanceStatus::Present, Some(8.0)),
            record(6, 1, ymd(2025, 10, 1), AttendanceStatus::Present, Some(8.0)),
            record(7, 2, day(1), AttendanceStatus::Present, Some(8.0)),
        ];

        let summary = monthly_summary(&records, 1, 10, 2026);
        assert_eq!(
            summary,
            MonthlySummary {
                present: 1,
                absent: 0,
                late: 2,
                half_day: 1,
                total_hours: 18.5,
            }
        );
    }

    #[test]
    fn monthly_absent_is_always_zero() {
        let records = vec![record(1, 1, day(1), AttendanceStatus::Absent, None)];

        let summary = monthly_summary(&records, 1, 10, 2026);
        assert_eq!(summary.absent, 0);
        assert!(summary.present + summary.late + summary.half_day <= 1);
        assert_eq!(monthly_summary(&[], 1, 10, 2026).absent, 0);
    }

    #[test]
    fn team_summary_lists_only_employees_in_order() {
        let users = vec![user(3, Role::Employee), user(1, Role::Manager), user(2, Role::Employee)];
        let records = vec![
            record(1, 2, day(5), AttendanceStatus::Late, Some(7.0)),
            record(2, 1, day(5), AttendanceStatus::Present, Some(9.0)),
        ];

        let team = team_monthly_summary(&users, &records, 10, 2026);
        assert_eq!(team.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(team[0].present + team[0].late, 0);
        assert_eq!(team[1].late, 1);
        assert_eq!(team[1].total_hours, 7.0);
    }

    #[test]
    fn today_roster_counts_by_set_difference() {
        let users = vec![
            user(1, Role::Employee),
            user(2, Role::Employee),
            user(3, Role::Employee),
            user(4, Role::Manager),
        ];
        let records = vec![
            record(1, 1, day(19), AttendanceStatus::Present, None),
            record(2, 2, day(19), AttendanceStatus::Late, Some(3.0)),
            record(3, 3, day(18), AttendanceStatus::Present, Some(8.0)),
            record(4, 4, day(19), AttendanceStatus::Present, None),
        ];

        let roster = today_roster(&users, &records, day(19));
        assert_eq!(roster.present, 2);
        assert_eq!(roster.late, 1);
        assert_eq!(roster.absent, 1);
        assert_eq!(roster.employees.len(), 3);
        assert_eq!(roster.employees[2].status, None);
        assert!(roster.employees[2].check_in_time.is_none());
        assert!(roster.employees[1].check_out_time.is_some());
    }

    #[test]
    fn manager_totals_subtract_all_records_today() {
        let users = vec![user(1, Role::Employee), user(2, Role::Employee), user(9, Role::Manager)];
        let records = vec![
            record(1, 1, day(19), AttendanceStatus::Late, None),
            record(2, 9, day(19), AttendanceStatus::Present, None),
        ];

        let totals = manager_dashboard_totals(&users, &records, day(19));
        assert_eq!(totals.total_employees, 2);
        // The manager's record counts too.
        assert_eq!(totals.today_stats.absent, 0);
        assert_eq!(totals.today_stats.present, 2);
        assert_eq!(totals.today_stats.late, 1);
        assert_eq!(
            totals.absent_today.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn employee_dashboard_is_month_to_date_and_recent_first() {
        let mut records: Vec<_> = (1..=10)
            .map(|d| record(d as u64, 1, day(d), AttendanceStatus::Present, Some(8.0)))
            .collect();
        records.push(record(11, 1, ymd(2026, 9, 30), AttendanceStatus::Late, Some(8.0)));

        let dashboard = employee_dashboard(&records, 1, day(10));
        assert_eq!(dashboard.today_attendance.as_ref().map(|r| r.id), Some(10));
        assert_eq!(dashboard.monthly_stats.present, 10);
        assert_eq!(dashboard.monthly_stats.late, 0);
        assert_eq!(dashboard.monthly_stats.total_hours, 80.0);
        assert_eq!(dashboard.recent_attendance.len(), 7);
        assert_eq!(dashboard.recent_attendance[0].date, day(10));
    }

    #[actix_web::test]
    async fn service_defaults_to_the_current_month() {
        let store = Arc::new(MemoryStore::with_data(
            vec![user(1, Role::Employee)],
            vec![
                record(1, 1, day(2), AttendanceStatus::Present, Some(8.0)),
                record(2, 1, ymd(2026, 9, 2), AttendanceStatus::Present, Some(8.0)),
            ],
        ));
        let service = AggregationService::new(store);
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
            .unwrap();

        let summary = service.monthly_summary(1, None, None, now).await.unwrap();
        assert_eq!(summary.present, 1);

        let team = service.team_monthly_summary(Some(9), Some(2026), now).await.unwrap();
        assert_eq!(team[0].present, 1);
    }
}
