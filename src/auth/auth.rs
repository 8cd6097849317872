use crate::error::AttendanceError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Identity attached to a request by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AttendanceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or(AttendanceError::NotAuthenticated),
        )
    }
}

impl AuthUser {
    pub fn require_manager(&self) -> Result<(), AttendanceError> {
        if self.role == Role::Manager {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden)
        }
    }
}
