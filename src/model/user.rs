use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "John Doe",
        "email": "john.doe@company.com",
        "role": "employee",
        "employee_code": "EMP001",
        "department": "Engineering"
    })
)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Display identifier, `EMP` followed by a zero-padded sequence number.
    pub employee_code: String,
    pub department: String,
    /// Argon2 PHC string. Never leaves the service.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl User {
    pub fn is_employee(&self) -> bool {
        self.role.is_employee()
    }
}

/// Sequential display code for the `n`th employee.
pub fn employee_code(n: usize) -> String {
    format!("EMP{:03}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_code_is_zero_padded() {
        assert_eq!(employee_code(1), "EMP001");
        assert_eq!(employee_code(42), "EMP042");
        assert_eq!(employee_code(1234), "EMP1234");
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: 7,
            name: "Ada".into(),
            email: "ada@company.com".into(),
            role: Role::Employee,
            employee_code: employee_code(1),
            department: "R&D".into(),
            password_hash: "$argon2id$secret".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "employee");
    }
}
