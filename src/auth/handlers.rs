use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token},
    config::Config,
    error::AttendanceError,
    model::user::User,
    models::{AuthResponse, LoginReqDto, RegisterReqDto},
    service::{DirectoryService, directory::NewUser},
};
use actix_web::{HttpResponse, web};
use tracing::{debug, error, info, instrument};

fn issue_token(user: User, config: &Config) -> Result<AuthResponse, AttendanceError> {
    let access_token = generate_access_token(&user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, user_id = user.id, "Failed to sign access token");
            AttendanceError::Internal("token signing failed".into())
        })?;

    Ok(AuthResponse { user, access_token })
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReqDto,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing name, email or password"),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "message": "email already registered"
        }))
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReqDto>,
    directory: web::Data<DirectoryService>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    let payload = payload.into_inner();

    let user = directory
        .register(NewUser {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            department: payload.department,
            role: payload.role,
        })
        .await?;

    Ok(HttpResponse::Created().json(issue_token(user, &config)?))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "invalid credentials"
        }))
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(payload, directory, config), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    directory: web::Data<DirectoryService>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    info!("Login request received");

    let user = directory
        .authenticate(&payload.email, &payload.password)
        .await?;

    info!(user_id = user.id, "Login successful");
    Ok(HttpResponse::Ok().json(issue_token(user, &config)?))
}

/// Profile of the caller
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(
    auth: AuthUser,
    directory: web::Data<DirectoryService>,
) -> actix_web::Result<HttpResponse> {
    debug!(user_id = auth.user_id, email = %auth.email, "Profile requested");

    let user = directory.profile(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}
