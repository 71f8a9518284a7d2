//! Employee Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which storage root an employee document was read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRoot {
    /// Current registry root
    #[default]
    Primary,
    /// Deprecated root still read for older records
    Fallback,
}

/// Employee entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile: String,
    /// Mirrors `mobile`; the mobile app logs in with it
    #[serde(default)]
    pub login_id: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub root: EmployeeRoot,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn default_role() -> String {
    "employee".to_string()
}

/// Create employee payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub name: String,
    pub mobile: String,
    pub password: String,
}

/// Update employee payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_employee_defaults() {
        let employee: Employee = serde_json::from_value(json!({
            "id": "e1",
            "name": "Rajesh Kumar",
            "mobile": "+91 9876543210",
            "password": "emp123"
        }))
        .unwrap();
        assert_eq!(employee.role, "employee");
        assert_eq!(employee.root, EmployeeRoot::Primary);
        assert_eq!(employee.login_id, "");
    }

    #[test]
    fn test_password_never_serialized() {
        let employee: Employee = serde_json::from_value(json!({
            "id": "e1", "name": "Priya", "mobile": "1", "password": "secret"
        }))
        .unwrap();
        let value = serde_json::to_value(&employee).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["root"], json!("primary"));
    }
}
