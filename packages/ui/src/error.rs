use api::BackendError;
use thiserror::Error;

use crate::route::Route;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingFields,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Backend(BackendError),
}

impl From<BackendError> for AuthError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::InvalidCredentials => AuthError::InvalidCredentials,
            other => AuthError::Backend(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("could not load data: {0}")]
    Backend(#[from] BackendError),

    #[error("unexpected data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("page was cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl PageError {
    /// The backend no longer accepts this session.
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, PageError::Backend(BackendError::NotAuthenticated))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PageError::Cancelled)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no page registered for route `{0}`")]
    UnknownRoute(Route),
}

/// Failure reported by a route listener.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl From<PageError> for ListenerError {
    fn from(e: PageError) -> Self {
        ListenerError(e.to_string())
    }
}
