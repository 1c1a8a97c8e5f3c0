//! Backend configuration from environment variables.

use crate::error::BackendError;

pub const URL_VAR: &str = "CLINIC_BACKEND_URL";
pub const ANON_KEY_VAR: &str = "CLINIC_BACKEND_ANON_KEY";
pub const COORDINATOR_EMAILS_VAR: &str = "CLINIC_COORDINATOR_EMAILS";

/// Where the hosted backend lives and how to address it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Project base URL, without trailing slash: `https://xyz.example.co`
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    /// Emails that get a coordinator profile when no profile row exists.
    pub coordinator_emails: Vec<String>,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            coordinator_emails: Vec::new(),
        }
    }

    pub fn with_coordinator_emails(mut self, emails: Vec<String>) -> Self {
        self.coordinator_emails = emails;
        self
    }

    /// Load from the environment (and `.env` when present).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, BackendError> {
        dotenvy::dotenv().ok();

        let url = std::env::var(URL_VAR).map_err(|_| BackendError::NotConfigured(URL_VAR))?;
        let anon_key =
            std::env::var(ANON_KEY_VAR).map_err(|_| BackendError::NotConfigured(ANON_KEY_VAR))?;
        let emails = std::env::var(COORDINATOR_EMAILS_VAR).unwrap_or_default();

        Ok(Self::new(url, anon_key).with_coordinator_emails(parse_email_list(&emails)))
    }

    /// On wasm there is no process environment; values are baked in at build time.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Result<Self, BackendError> {
        let url = option_env!("CLINIC_BACKEND_URL").ok_or(BackendError::NotConfigured(URL_VAR))?;
        let anon_key = option_env!("CLINIC_BACKEND_ANON_KEY")
            .ok_or(BackendError::NotConfigured(ANON_KEY_VAR))?;
        let emails = option_env!("CLINIC_COORDINATOR_EMAILS").unwrap_or("");

        Ok(Self::new(url, anon_key).with_coordinator_emails(parse_email_list(emails)))
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }

    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.url, path.trim_start_matches('/'))
    }
}

/// Split a comma-separated list, trimming and lowercasing each entry.
pub fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_joined_without_double_slashes() {
        let config = BackendConfig::new("https://clinic.example.co/", "anon");
        assert_eq!(config.url, "https://clinic.example.co");
        assert_eq!(
            config.auth_url("/token?grant_type=password"),
            "https://clinic.example.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            config.rest_url("rpc/dashboard_stats"),
            "https://clinic.example.co/rest/v1/rpc/dashboard_stats"
        );
    }

    #[test]
    fn test_email_list_parsing() {
        assert_eq!(
            parse_email_list(" Ana@Clinic.com, ,bruno@clinic.com "),
            vec!["ana@clinic.com".to_string(), "bruno@clinic.com".to_string()]
        );
        assert!(parse_email_list("").is_empty());
    }
}
