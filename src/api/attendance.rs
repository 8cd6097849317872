use crate::api::{PeriodQuery, local_now};
use crate::auth::auth::AuthUser;
use crate::service::{AggregationService, AttendanceService};
use actix_web::{HttpResponse, web};

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    attendance: web::Data<AttendanceService>,
) -> actix_web::Result<HttpResponse> {
    let record = attendance.check_in(auth.user_id, local_now()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "No check-in today or already checked out", body = Object, example = json!({
            "message": "no check-in found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    attendance: web::Data<AttendanceService>,
) -> actix_web::Result<HttpResponse> {
    let record = attendance.check_out(auth.user_id, local_now()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Today's record of the caller, `null` before check-in
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record or null", body = Option<crate::model::attendance::AttendanceRecord>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    attendance: web::Data<AttendanceService>,
) -> actix_web::Result<HttpResponse> {
    let record = attendance.get_today(auth.user_id, local_now()).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Own records, newest first", body = [crate::model::attendance::AttendanceRecord]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    attendance: web::Data<AttendanceService>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<HttpResponse> {
    let records = attendance
        .get_history(
            auth.user_id,
            query.month,
            query.year,
            local_now().date_naive(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Monthly counts and hours", body = crate::service::aggregation::MonthlySummary),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn summary(
    auth: AuthUser,
    aggregation: web::Data<AggregationService>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<HttpResponse> {
    let summary = aggregation
        .monthly_summary(auth.user_id, query.month, query.year, local_now())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/employee",
    responses(
        (status = 200, description = "Today, month to date and recent records", body = crate::service::aggregation::EmployeeDashboard),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn employee_dashboard(
    auth: AuthUser,
    aggregation: web::Data<AggregationService>,
) -> actix_web::Result<HttpResponse> {
    let dashboard = aggregation
        .employee_dashboard(auth.user_id, local_now())
        .await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{TestState, user};
    use crate::model::{attendance::AttendanceRecord, role::Role};
    use crate::store::RecordStore;
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn check_in_twice_returns_bad_request() {
        let ada = user(1, "Ada", Role::Employee);
        let state = TestState::new(vec![ada.clone()]);
        let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/attendance/check-in")
            .insert_header(state.bearer(&ada))
            .to_request();
        let record: AttendanceRecord = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record.user_id, 1);

        let req = test::TestRequest::post()
            .uri("/api/attendance/check-in")
            .insert_header(state.bearer(&ada))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.store.load_records().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn check_out_without_check_in_returns_bad_request() {
        let ada = user(1, "Ada", Role::Employee);
        let state = TestState::new(vec![ada.clone()]);
        let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/attendance/check-out")
            .insert_header(state.bearer(&ada))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "no check-in found");
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let state = TestState::new(vec![]);
        let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/attendance/today")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn invalid_month_is_rejected() {
        let ada = user(1, "Ada", Role::Employee);
        let state = TestState::new(vec![ada.clone()]);
        let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/attendance/summary?month=13")
            .insert_header(state.bearer(&ada))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
