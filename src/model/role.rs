use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    Employee,
    Manager,
}

impl Role {
    pub fn is_employee(&self) -> bool {
        *self == Role::Employee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_stored_names() {
        assert_eq!(Role::from_str("employee").unwrap(), Role::Employee);
        assert_eq!(Role::from_str("manager").unwrap(), Role::Manager);
        assert!(Role::from_str("admin").is_err());
        assert_eq!(Role::Manager.to_string(), "manager");
    }
}
