use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{AuthEvent, AuthEventHub, AuthEvents, AuthUser};
use crate::error::BackendError;
use crate::models::ProfileRow;
use crate::query::Query;
use crate::Backend;

#[derive(Debug, Default)]
struct State {
    users: Vec<(AuthUser, String)>,
    profiles: HashMap<String, ProfileRow>,
    tables: HashMap<String, Vec<serde_json::Value>>,
    rpcs: HashMap<String, serde_json::Value>,
    session: Option<AuthUser>,
    select_counts: HashMap<String, usize>,
    fail_selects: bool,
    fail_profiles: bool,
    reject_tokens: bool,
}

/// In-memory Backend for testing and offline demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    events: AuthEventHub,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account; returns the generated identity.
    pub fn add_user(&self, email: &str, password: &str, name: Option<&str>) -> AuthUser {
        let metadata = match name {
            Some(n) => serde_json::json!({ "name": n }),
            None => serde_json::json!({}),
        };
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_lowercase()),
            user_metadata: metadata,
        };
        self.state
            .lock()
            .users
            .push((user.clone(), password.to_string()));
        user
    }

    pub fn set_profile(&self, profile: ProfileRow) {
        self.state.lock().profiles.insert(profile.id.clone(), profile);
    }

    pub fn insert_rows(&self, table: &str, rows: Vec<serde_json::Value>) {
        self.state
            .lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn set_rpc_result(&self, name: &str, value: serde_json::Value) {
        self.state.lock().rpcs.insert(name.to_string(), value);
    }

    pub fn fail_selects(&self, fail: bool) {
        self.state.lock().fail_selects = fail;
    }

    pub fn fail_profiles(&self, fail: bool) {
        self.state.lock().fail_profiles = fail;
    }

    /// Answer data calls with `NotAuthenticated`, as for an expired session
    /// that can no longer be refreshed. No auth event is emitted.
    pub fn reject_tokens(&self, reject: bool) {
        self.state.lock().reject_tokens = reject;
    }

    /// How many `select` calls hit `table`.
    pub fn select_count(&self, table: &str) -> usize {
        self.state
            .lock()
            .select_counts
            .get(table)
            .copied()
            .unwrap_or(0)
    }

    /// Simulate a session change originating outside the client (e.g. another tab).
    pub fn emit(&self, event: AuthEvent) {
        {
            let mut state = self.state.lock();
            state.session = event.user().cloned();
        }
        self.events.emit(event);
    }
}

impl Backend for MemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        let user = {
            let mut state = self.state.lock();
            let email = email.trim().to_lowercase();
            let user = state
                .users
                .iter()
                .find(|(u, p)| u.email.as_deref() == Some(email.as_str()) && p == password)
                .map(|(u, _)| u.clone())
                .ok_or(BackendError::InvalidCredentials)?;
            state.session = Some(user.clone());
            user
        };
        self.events.emit(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthUser, BackendError> {
        let exists = self
            .state
            .lock()
            .users
            .iter()
            .any(|(u, _)| u.email.as_deref() == Some(email.to_lowercase().as_str()));
        if exists {
            return Err(BackendError::Status {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let user = self.add_user(email, password, Some(name));
        self.state.lock().session = Some(user.clone());
        self.events.emit(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.state.lock().session = None;
        self.events.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        Ok(self.state.lock().session.clone())
    }

    async fn refresh_session(&self) -> Result<Option<AuthUser>, BackendError> {
        let user = {
            let mut state = self.state.lock();
            if state.reject_tokens {
                state.session = None;
            }
            state.session.clone()
        };
        if let Some(user) = &user {
            self.events.emit(AuthEvent::TokenRefreshed(user.clone()));
        }
        Ok(user)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError> {
        let state = self.state.lock();
        if state.reject_tokens {
            return Err(BackendError::NotAuthenticated);
        }
        if state.fail_profiles {
            return Err(BackendError::Status {
                status: 500,
                message: "profiles unavailable".to_string(),
            });
        }
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn select(&self, query: &Query) -> Result<Vec<serde_json::Value>, BackendError> {
        let mut state = self.state.lock();
        *state
            .select_counts
            .entry(query.table_name().to_string())
            .or_default() += 1;
        if state.reject_tokens {
            return Err(BackendError::NotAuthenticated);
        }
        if state.fail_selects {
            return Err(BackendError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        let rows = state
            .tables
            .get(query.table_name())
            .cloned()
            .unwrap_or_default();
        let mut rows: Vec<_> = rows
            .into_iter()
            .filter(|row| {
                query.eq_filters().all(|(col, value)| match row.get(col) {
                    Some(serde_json::Value::String(s)) => s == value,
                    Some(other) => other.to_string() == value,
                    None => false,
                })
            })
            .collect();
        if let Some(limit) = query.limit_value() {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn rpc(
        &self,
        name: &str,
        _args: serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let state = self.state.lock();
        if state.reject_tokens {
            return Err(BackendError::NotAuthenticated);
        }
        state
            .rpcs
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::Status {
                status: 404,
                message: format!("function {name} not found"),
            })
    }

    fn subscribe_auth(&self) -> AuthEvents {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let backend = MemoryBackend::new();
        backend.add_user("ana@clinic.com", "secret", Some("Ana"));

        let err = backend
            .sign_in_with_password("ana@clinic.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidCredentials));
        assert!(backend.current_user().await.unwrap().is_none());

        let user = backend
            .sign_in_with_password("ANA@clinic.com", "secret")
            .await
            .unwrap();
        assert_eq!(backend.current_user().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_auth_calls_emit_events() {
        let backend = MemoryBackend::new();
        backend.add_user("ana@clinic.com", "secret", None);
        let mut events = backend.subscribe_auth();

        let user = backend
            .sign_in_with_password("ana@clinic.com", "secret")
            .await
            .unwrap();
        backend.sign_out().await.unwrap();

        assert_eq!(events.next().await, Some(AuthEvent::SignedIn(user)));
        assert_eq!(events.next().await, Some(AuthEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_select_applies_eq_filters_and_limit() {
        let backend = MemoryBackend::new();
        backend.insert_rows(
            "clients",
            vec![
                serde_json::json!({ "id": "1", "name": "A", "active": true }),
                serde_json::json!({ "id": "2", "name": "B", "active": false }),
                serde_json::json!({ "id": "3", "name": "C", "active": true }),
            ],
        );

        let active = backend
            .select(&Query::table("clients").eq("active", true))
            .await
            .unwrap();
        assert_eq!(active.len(), 2);

        let one = backend
            .select(&Query::table("clients").limit(1))
            .await
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(backend.select_count("clients"), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MemoryBackend::new();
        backend.fail_selects(true);
        assert!(backend.select(&Query::table("clients")).await.is_err());

        backend.fail_profiles(true);
        assert!(backend.fetch_profile("anyone").await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_tokens_fail_data_calls_and_refresh() {
        let backend = MemoryBackend::new();
        backend.add_user("ana@clinic.com", "secret", None);
        backend.set_rpc_result("dashboard_stats", serde_json::json!({}));
        let user = backend
            .sign_in_with_password("ana@clinic.com", "secret")
            .await
            .unwrap();
        assert_eq!(backend.refresh_session().await.unwrap(), Some(user));

        backend.reject_tokens(true);
        assert!(matches!(
            backend.select(&Query::table("clients")).await,
            Err(BackendError::NotAuthenticated)
        ));
        assert!(matches!(
            backend.rpc("dashboard_stats", serde_json::json!({})).await,
            Err(BackendError::NotAuthenticated)
        ));
        assert_eq!(backend.refresh_session().await.unwrap(), None);
        assert!(backend.current_user().await.unwrap().is_none());
    }
}
