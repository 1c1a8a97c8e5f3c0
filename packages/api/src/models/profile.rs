use serde::{Deserialize, Serialize};

use super::Record;

/// Application profile row joined to an auth identity by `id`.
///
/// `role` is kept as the raw stored string; the session layer decides how to
/// interpret it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileRow {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Record for ProfileRow {
    const TABLE: &'static str = "profiles";
}
