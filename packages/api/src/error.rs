use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("{0} not set")]
    NotConfigured(&'static str),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_classify_server_side_as_transient() {
        let server = BackendError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        let client = BackendError::Status {
            status: 404,
            message: "missing".into(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!BackendError::InvalidCredentials.is_transient());
    }
}
