//! Session data types.

use serde::{Deserialize, Serialize};

/// Identity returned by the auth subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata captured at sign-up (`name`, `full_name`, ...).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// Look up a string field in `user_metadata`.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Tokens issued by a password grant or refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_lookup_ignores_blank_values() {
        let user = AuthUser {
            id: "u1".into(),
            email: Some("ana@clinic.com".into()),
            user_metadata: serde_json::json!({ "name": "  ", "full_name": "Ana Souza" }),
        };
        assert_eq!(user.metadata_str("name"), None);
        assert_eq!(user.metadata_str("full_name"), Some("Ana Souza"));
        assert_eq!(user.metadata_str("missing"), None);
    }

    #[test]
    fn test_auth_user_decodes_without_metadata() {
        let user: AuthUser = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(user.id, "abc");
        assert!(user.email.is_none());
        assert!(user.user_metadata.is_null());
    }
}
