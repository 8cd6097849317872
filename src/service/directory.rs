//! User registration and credential checks.

use std::sync::Arc;

use futures::lock::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{WRITE_ATTEMPTS, next_id};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AttendanceError, Result, StoreError};
use crate::model::{
    role::Role,
    user::{User, employee_code},
};
use crate::store::{RecordStore, Snapshot};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    pub role: Option<Role>,
}

pub struct DirectoryService {
    store: Arc<dyn RecordStore>,
    write_gate: Mutex<()>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_gate: Mutex::new(()),
        }
    }

    #[instrument(
        name = "directory_register",
        skip(self, new_user),
        fields(email = %new_user.email)
    )]
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let name = new_user.name.trim();
        let email = new_user.email.trim();

        if name.is_empty() || email.is_empty() || new_user.password.is_empty() {
            return Err(AttendanceError::InvalidInput(
                "Name, email and password must not be empty".into(),
            ));
        }

        let password_hash = hash_password(&new_user.password)
            .map_err(|e| AttendanceError::Internal(format!("password hashing failed: {e}")))?;
        let role = new_user.role.unwrap_or_default();
        let department = new_user.department.trim();

        let _guard = self.write_gate.lock().await;

        let mut attempt = 1;
        let user = loop {
            let Snapshot {
                items: mut users,
                version,
            } = self.store.users_snapshot().await?;

            if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
                info!("Registration rejected: email already registered");
                return Err(AttendanceError::EmailAlreadyRegistered);
            }

            let employees = users.iter().filter(|u| u.is_employee()).count();
            let user = User {
                id: next_id(users.iter().map(|u| u.id)),
                name: name.to_string(),
                email: email.to_string(),
                role,
                employee_code: employee_code(employees + 1),
                department: department.to_string(),
                password_hash: password_hash.clone(),
            };
            users.push(user.clone());

            match self.store.replace_users(&users, version).await {
                Ok(()) => break user,
                Err(StoreError::Conflict) if attempt < WRITE_ATTEMPTS => {
                    warn!(attempt, version, "Users changed concurrently, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        info!(user_id = user.id, employee_code = %user.employee_code, "User registered");
        Ok(user)
    }

    #[instrument(name = "directory_authenticate", skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let users = self.store.load_users().await?;

        let user = users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .ok_or_else(|| {
                debug!("Invalid credentials: user not found");
                AttendanceError::InvalidCredentials
            })?;

        verify_password(password, &user.password_hash).map_err(|e| {
            debug!(error = %e, "Invalid credentials: password mismatch");
            AttendanceError::InvalidCredentials
        })?;

        Ok(user)
    }

    /// Resolves an authenticated id back to its user.
    pub async fn profile(&self, user_id: u64) -> Result<User> {
        self.store
            .load_users()
            .await?
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or(AttendanceError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn new_user(email: &str, role: Option<Role>) -> NewUser {
        NewUser {
            name: "Someone".into(),
            email: email.into(),
            password: "pa55word".into(),
            department: "Engineering".into(),
            role,
        }
    }

    #[actix_web::test]
    async fn employee_codes_count_employees_only() {
        let directory = DirectoryService::new(Arc::new(MemoryStore::new()));

        let first = directory.register(new_user("a@company.com", None)).await.unwrap();
        let boss = directory
            .register(new_user("boss@company.com", Some(Role::Manager)))
            .await
            .unwrap();
        let second = directory.register(new_user("b@company.com", None)).await.unwrap();

        assert_eq!(first.employee_code, "EMP001");
        assert_eq!(first.role, Role::Employee);
        assert_eq!(boss.employee_code, "EMP002");
        assert_eq!(second.employee_code, "EMP002");
        assert_eq!((first.id, boss.id, second.id), (1, 2, 3));
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let directory = DirectoryService::new(Arc::new(MemoryStore::new()));
        directory.register(new_user("a@company.com", None)).await.unwrap();

        let err = directory
            .register(new_user("A@Company.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::EmailAlreadyRegistered));
    }

    #[actix_web::test]
    async fn empty_fields_are_rejected() {
        let directory = DirectoryService::new(Arc::new(MemoryStore::new()));

        let err = directory.register(new_user("  ", None)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidInput(_)));
    }

    #[actix_web::test]
    async fn authenticate_checks_the_password() {
        let directory = DirectoryService::new(Arc::new(MemoryStore::new()));
        let user = directory.register(new_user("a@company.com", None)).await.unwrap();

        let found = directory.authenticate("a@company.com", "pa55word").await.unwrap();
        assert_eq!(found.id, user.id);

        let err = directory.authenticate("a@company.com", "nope").await.unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidCredentials));
        let err = directory.authenticate("x@company.com", "pa55word").await.unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidCredentials));

        assert_eq!(directory.profile(user.id).await.unwrap().email, "a@company.com");
        assert!(matches!(
            directory.profile(42).await.unwrap_err(),
            AttendanceError::NotAuthenticated
        ));
    }
}
