//! Error kinds surfaced by the attendance core.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AttendanceError>;

/// Failures of the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQL request failed: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("stored row is not readable: {0}")]
    Corrupt(String),

    #[error("in-memory store lock poisoned")]
    Poisoned,

    #[error("collection was changed by another writer")]
    Conflict,
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("manager role required")]
    Forbidden,

    #[error("already checked in today")]
    AlreadyCheckedIn,

    #[error("no check-in found")]
    NoCheckInFound,

    #[error("already checked out")]
    AlreadyCheckedOut,

    #[error("check-out time must be later than check-in time")]
    CheckOutBeforeCheckIn,

    #[error("email already registered")]
    EmailAlreadyRegistered,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("month must be between 1 and 12, got {0}")]
    InvalidPeriod(u32),

    #[error("{0}")]
    InvalidInput(String),

    #[error("internal server error, {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::NotAuthenticated | AttendanceError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AttendanceError::Forbidden => StatusCode::FORBIDDEN,
            AttendanceError::EmailAlreadyRegistered
            | AttendanceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
            AttendanceError::AlreadyCheckedIn
            | AttendanceError::NoCheckInFound
            | AttendanceError::AlreadyCheckedOut
            | AttendanceError::CheckOutBeforeCheckIn
            | AttendanceError::InvalidPeriod(_)
            | AttendanceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Internal(_) | AttendanceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_errors_are_bad_requests() {
        assert_eq!(
            AttendanceError::AlreadyCheckedIn.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::NoCheckInFound.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::EmailAlreadyRegistered.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AttendanceError::Store(StoreError::Conflict).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AttendanceError::Store(StoreError::Poisoned).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
