use serde::{Deserialize, Serialize};

use super::default_status;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Only sent when creating a user or changing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_status")]
    pub status: i32,
}

fn default_role() -> String {
    "USER".to_string()
}

impl User {
    /// Name for tables: full name, or the username when no name is set.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_password_omitted() {
        let user: User = serde_json::from_str(r#"{"id":9,"username":"bob"}"#).unwrap();
        assert_eq!(user.role, "USER");
        assert_eq!(user.status, 1);
        assert_eq!(user.display_name(), "bob");

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["fullName"], "");
    }
}
