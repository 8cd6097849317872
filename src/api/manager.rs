//! Team-wide views. Every handler here requires the manager role.

use crate::api::{PeriodQuery, local_now};
use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceStatus;
use crate::service::{AggregationService, ReportService, report::ReportFilter};
use actix_web::{HttpResponse, http::header, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Exact day
    #[param(value_type = Option<String>, example = "2026-10-19")]
    pub date: Option<NaiveDate>,
    /// Range start, only applied together with `end_date`
    #[param(value_type = Option<String>, example = "2026-10-01")]
    pub start_date: Option<NaiveDate>,
    /// Range end (inclusive)
    #[param(value_type = Option<String>, example = "2026-10-31")]
    pub end_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "late")]
    pub status: Option<AttendanceStatus>,
    pub user_id: Option<u64>,
}

fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    start.zip(end)
}

impl From<ReportQuery> for ReportFilter {
    fn from(q: ReportQuery) -> Self {
        ReportFilter {
            date: q.date,
            date_range: date_range(q.start_date, q.end_date),
            status: q.status,
            user_id: q.user_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    #[param(value_type = Option<String>, example = "2026-10-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2026-10-31")]
    pub end_date: Option<NaiveDate>,
}

#[utoipa::path(
    get,
    path = "/api/manager/attendance",
    params(ReportQuery),
    responses(
        (status = 200, description = "Matching records joined with employee data, newest first", body = [crate::service::report::JoinedRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manager"
)]
pub async fn list_attendance(
    auth: AuthUser,
    reports: web::Data<ReportService>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let filter = ReportFilter::from(query.into_inner());
    let rows = reports.filter_records(&filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/manager/attendance/export",
    params(ReportQuery),
    responses(
        (status = 200, description = "CSV export", body = String, content_type = "text/csv"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manager"
)]
pub async fn export_attendance(
    auth: AuthUser,
    reports: web::Data<ReportService>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let filter = ReportFilter::from(query.into_inner());
    let csv = reports.export_csv(&filter).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"attendance.csv\"",
        ))
        .body(csv))
}

#[utoipa::path(
    get,
    path = "/api/manager/employees/{id}/attendance",
    params(
        ("id" = u64, Path, description = "User id of the employee"),
        RangeQuery
    ),
    responses(
        (status = 200, description = "Up to 30 most recent records", body = [crate::service::report::JoinedRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manager"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    reports: web::Data<ReportService>,
    path: web::Path<u64>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let rows = reports
        .employee_attendance(path.into_inner(), date_range(query.start_date, query.end_date))
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/manager/summary",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Per-employee monthly summary", body = [crate::service::aggregation::TeamMemberSummary]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manager"
)]
pub async fn team_summary(
    auth: AuthUser,
    aggregation: web::Data<AggregationService>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let summary = aggregation
        .team_monthly_summary(query.month, query.year, local_now())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/manager/today",
    responses(
        (status = 200, description = "Who is in today", body = crate::service::aggregation::TodayRoster),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manager"
)]
pub async fn today_roster(
    auth: AuthUser,
    aggregation: web::Data<AggregationService>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let roster = aggregation.today_roster(local_now()).await?;
    Ok(HttpResponse::Ok().json(roster))
}

#[utoipa::path(
    get,
    path = "/api/manager/dashboard",
    responses(
        (status = 200, description = "Headcount and today's totals", body = crate::service::aggregation::ManagerDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manager"
)]
pub async fn dashboard(
    auth: AuthUser,
    aggregation: web::Data<AggregationService>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager()?;

    let dashboard = aggregation.manager_dashboard(local_now()).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{TestState, user};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, test};
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn morning() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 8, 45, 0)
            .unwrap()
    }

    #[actix_web::test]
    async fn lone_range_bound_is_ignored() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 1);
        assert_eq!(date_range(d, None), None);
        assert_eq!(date_range(None, d), None);
        assert!(date_range(d, d).is_some());
    }

    #[actix_web::test]
    async fn employees_cannot_read_team_views() {
        let ada = user(1, "Ada", Role::Employee);
        let state = TestState::new(vec![ada.clone()]);
        let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

        for uri in ["/api/manager/attendance", "/api/manager/today", "/api/manager/dashboard"] {
            let req = test::TestRequest::get()
                .uri(uri)
                .insert_header(state.bearer(&ada))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[actix_web::test]
    async fn roster_and_export_reflect_check_ins() {
        let ada = user(1, "Ada", Role::Employee);
        let grace = user(2, "Grace", Role::Employee);
        let linus = user(3, "Linus", Role::Employee);
        let boss = user(4, "Boss", Role::Manager);
        let state = TestState::new(vec![ada.clone(), grace.clone(), linus, boss.clone()]);
        let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

        for who in [&ada, &grace] {
            state.attendance.check_in(who.id, morning()).await.unwrap();
        }

        let roster = state.aggregation.today_roster(morning()).await.unwrap();
        assert_eq!((roster.present, roster.absent), (2, 1));

        // The handler reads the wall clock, so only date-independent totals are checked.
        let req = test::TestRequest::get()
            .uri("/api/manager/today")
            .insert_header(state.bearer(&boss))
            .to_request();
        let roster: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(roster["employees"].as_array().unwrap().len(), 3);
        assert_eq!(
            roster["present"].as_u64().unwrap() + roster["absent"].as_u64().unwrap(),
            3
        );

        let req = test::TestRequest::get()
            .uri("/api/manager/attendance/export")
            .insert_header(state.bearer(&boss))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv"
        );
        let body = test::read_body(resp).await;
        let csv = std::str::from_utf8(&body).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with(
            "Employee ID,Name,Department,Date,Check In,Check Out,Status,Total Hours"
        ));
        assert!(csv.contains(",2026-10-19,2026-10-19T06:45:00.000Z,,present,0"));
    }
}
