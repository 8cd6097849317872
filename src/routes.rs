use crate::{
    api::{attendance, manager},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .configure(protected_routes),
    );
}

pub fn protected_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/me").route(web::get().to(handlers::me)))
        .service(
            web::scope("/attendance")
                .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
                .service(web::resource("/today").route(web::get().to(attendance::today)))
                .service(web::resource("/history").route(web::get().to(attendance::history)))
                .service(web::resource("/summary").route(web::get().to(attendance::summary))),
        )
        .service(
            web::resource("/dashboard/employee")
                .route(web::get().to(attendance::employee_dashboard)),
        )
        .service(
            web::scope("/manager")
                // /manager/attendance
                .service(
                    web::resource("/attendance").route(web::get().to(manager::list_attendance)),
                )
                .service(
                    web::resource("/attendance/export")
                        .route(web::get().to(manager::export_attendance)),
                )
                // /manager/employees/{id}/attendance
                .service(
                    web::resource("/employees/{id}/attendance")
                        .route(web::get().to(manager::employee_attendance)),
                )
                .service(web::resource("/summary").route(web::get().to(manager::team_summary)))
                .service(web::resource("/today").route(web::get().to(manager::today_roster)))
                .service(web::resource("/dashboard").route(web::get().to(manager::dashboard))),
        );
}

// REGISTER / LOGIN
//  └─ access_token (ACCESS_TOKEN_TTL, default 15 min)

// API REQUEST
//  └─ Authorization: Bearer access_token
