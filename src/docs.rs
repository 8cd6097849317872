use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    role::Role,
    user::User,
};
use crate::models::{AuthResponse, LoginReqDto, RegisterReqDto};
use crate::service::{
    aggregation::{
        DayCounts, EmployeeDashboard, ManagerDashboard, MonthlySummary, RosterEntry,
        TeamMemberSummary, TodayRoster,
    },
    report::JoinedRecord,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "0.1.0",
        description = r#"
## Employee Attendance

Daily check-in / check-out for employees, with monthly summaries, a live
"who is in today" roster and filterable, exportable reports for managers.

### Rules
- One record per employee per day, opened by check-in and closed by check-out.
- A check-in between 09:00 and 11:59 local time is **late**, any other time **present**.
- Worked hours are the exact time between check-in and check-out.

### Security
All `/api` endpoints require a **JWT Bearer** token from `/auth/login` or
`/auth/register`. `/api/manager/*` additionally requires the manager role.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::summary,
        crate::api::attendance::employee_dashboard,

        crate::api::manager::list_attendance,
        crate::api::manager::export_attendance,
        crate::api::manager::employee_attendance,
        crate::api::manager::team_summary,
        crate::api::manager::today_roster,
        crate::api::manager::dashboard
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            Role,
            User,
            RegisterReqDto,
            LoginReqDto,
            AuthResponse,
            MonthlySummary,
            TeamMemberSummary,
            RosterEntry,
            TodayRoster,
            DayCounts,
            ManagerDashboard,
            EmployeeDashboard,
            JoinedRecord
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Attendance", description = "Own check-in, check-out and history"),
        (name = "Dashboard", description = "Employee dashboard"),
        (name = "Manager", description = "Team reports, roster and export"),
    )
)]
pub struct ApiDoc;
