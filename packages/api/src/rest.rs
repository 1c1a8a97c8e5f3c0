//! # REST backend: `reqwest` client for the hosted service
//!
//! Talks to the two halves of the backend:
//!
//! | Endpoint | Used by |
//! |----------|---------|
//! | `POST /auth/v1/token?grant_type=password` | [`Backend::sign_in_with_password`] |
//! | `POST /auth/v1/token?grant_type=refresh_token` | [`Backend::refresh_session`] |
//! | `POST /auth/v1/signup` | [`Backend::sign_up`] |
//! | `POST /auth/v1/logout` | [`Backend::sign_out`] |
//! | `GET /auth/v1/user` | [`Backend::current_user`] |
//! | `GET /rest/v1/{table}?{query}` | [`Backend::select`], [`Backend::fetch_profile`] |
//! | `POST /rest/v1/rpc/{name}` | [`Backend::rpc`] |
//!
//! Every request carries the `apikey` header; once signed in, requests also
//! carry the user's bearer token so row-level auth applies. `reqwest` uses
//! `fetch` on wasm, so the same client runs in the browser.
//!
//! ## Session lifetime
//!
//! With a token store attached ([`RestBackend::with_token_store`]) the issued
//! tokens are written under [`SESSION_KEY`] and restored on the next visit.
//! A rejected access token is exchanged once for a new one through
//! `POST /auth/v1/token?grant_type=refresh_token`, which emits
//! [`AuthEvent::TokenRefreshed`]. When the refresh is refused too, the session
//! is ended locally and [`AuthEvent::SignedOut`] is emitted.

use parking_lot::Mutex;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use store::PreferenceStore;

use crate::auth::{AuthEvent, AuthEventHub, AuthEvents, AuthTokens, AuthUser};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::models::{ProfileRow, Record};
use crate::query::Query;
use crate::Backend;

/// Preference key holding the serialized [`AuthTokens`].
pub const SESSION_KEY: &str = "clinic.session";

#[derive(Clone)]
pub struct RestBackend {
    config: BackendConfig,
    http: reqwest::Client,
    tokens: Arc<Mutex<Option<AuthTokens>>>,
    events: AuthEventHub,
    token_store: Option<Rc<dyn PreferenceStore>>,
}

impl fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestBackend")
            .field("config", &self.config)
            .field("signed_in", &self.tokens.lock().is_some())
            .field("persistent", &self.token_store.is_some())
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(flatten)]
    tokens: AuthTokens,
    user: AuthUser,
}

/// Error bodies differ between the auth and REST halves of the backend.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            tokens: Arc::new(Mutex::new(None)),
            events: AuthEventHub::new(),
            token_store: None,
        }
    }

    /// Persist tokens in `store` and restore whatever session it holds.
    pub fn with_token_store(mut self, store: Rc<dyn PreferenceStore>) -> Self {
        let restored = store.get(SESSION_KEY).and_then(|raw| {
            match serde_json::from_str::<AuthTokens>(&raw) {
                Ok(tokens) => Some(tokens),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable stored session");
                    store.remove(SESSION_KEY);
                    None
                }
            }
        });
        if restored.is_some() {
            tracing::debug!("restored stored session");
        }
        *self.tokens.lock() = restored;
        self.token_store = Some(store);
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Replace the held session, writing it through to the token store.
    pub fn set_tokens(&self, tokens: Option<AuthTokens>) {
        if let Some(store) = &self.token_store {
            match &tokens {
                Some(t) => match serde_json::to_string(t) {
                    Ok(json) => store.set(SESSION_KEY, &json),
                    Err(e) => tracing::warn!(error = %e, "failed to serialize session"),
                },
                None => store.remove(SESSION_KEY),
            }
        }
        *self.tokens.lock() = tokens;
    }

    fn access_token(&self) -> Option<String> {
        self.tokens.lock().as_ref().map(|t| t.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens.lock().as_ref().and_then(|t| t.refresh_token.clone())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.config.anon_key.clone());
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    fn select_request(&self, query: &Query) -> RequestBuilder {
        self.http
            .get(self.config.rest_url(query.table_name()))
            .query(&query.params())
    }

    /// Drop the session locally and tell subscribers.
    fn end_session(&self) {
        self.set_tokens(None);
        self.events.emit(AuthEvent::SignedOut);
    }

    /// Send an authorized request, refreshing the session once on a 401.
    ///
    /// If the session cannot be refreshed it is ended and the call fails with
    /// [`BackendError::NotAuthenticated`].
    async fn send_authorized(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, BackendError> {
        let signed_in = self.access_token().is_some();
        let response = self.authorize(build()).send().await?;
        match Self::check(response).await {
            Err(BackendError::NotAuthenticated) if signed_in => {}
            other => return other,
        }

        tracing::info!("access token rejected, refreshing session");
        if self.refresh_session().await?.is_none() {
            self.end_session();
            return Err(BackendError::NotAuthenticated);
        }
        let response = self.authorize(build()).send().await?;
        match Self::check(response).await {
            Err(BackendError::NotAuthenticated) => {
                tracing::warn!("refreshed token rejected, ending session");
                self.end_session();
                Err(BackendError::NotAuthenticated)
            }
            other => other,
        }
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .into_message()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        if status == StatusCode::BAD_REQUEST && message.to_lowercase().contains("invalid login") {
            return Err(BackendError::InvalidCredentials);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::NotAuthenticated);
        }
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// The auth server refused the refresh token itself (as opposed to being unreachable).
fn is_refresh_rejection(error: &BackendError) -> bool {
    matches!(
        error,
        BackendError::NotAuthenticated
            | BackendError::InvalidCredentials
            | BackendError::Status {
                status: 400 | 403, ..
            }
    )
}

impl Backend for RestBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        let response = self
            .http
            .post(self.config.auth_url("token?grant_type=password"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let TokenResponse { tokens, user } = Self::check(response).await?.json().await?;

        self.set_tokens(Some(tokens));
        tracing::info!(user_id = %user.id, "signed in");
        self.events.emit(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthUser, BackendError> {
        let response = self
            .http
            .post(self.config.auth_url("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;
        let value: serde_json::Value = Self::check(response).await?.json().await?;

        // With email confirmation disabled the backend returns a full session.
        match serde_json::from_value::<TokenResponse>(value.clone()) {
            Ok(TokenResponse { tokens, user }) => {
                self.set_tokens(Some(tokens));
                self.events.emit(AuthEvent::SignedIn(user.clone()));
                Ok(user)
            }
            Err(_) => Ok(serde_json::from_value(value)?),
        }
    }

    /// Always ends the local session; a failed `/logout` is only logged.
    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.access_token().is_some() {
            let result = match self
                .authorize(self.http.post(self.config.auth_url("logout")))
                .send()
                .await
            {
                Ok(response) => Self::check(response).await.map(drop),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "logout request failed, ending session locally");
            }
        }
        self.end_session();
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        if self.access_token().is_none() {
            return Ok(None);
        }
        let response = self
            .authorize(self.http.get(self.config.auth_url("user")))
            .send()
            .await?;
        match Self::check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(BackendError::NotAuthenticated) => {
                tracing::debug!("stored access token rejected, refreshing");
                let user = self.refresh_session().await?;
                if user.is_none() {
                    self.set_tokens(None);
                }
                Ok(user)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns `Ok(None)` when there is no refresh token or the auth server
    /// refuses it; the stored session is cleared in the latter case. Network
    /// failures keep the session for a later attempt.
    async fn refresh_session(&self) -> Result<Option<AuthUser>, BackendError> {
        let Some(refresh_token) = self.refresh_token() else {
            return Ok(None);
        };
        let response = self
            .http
            .post(self.config.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        match Self::check(response).await {
            Ok(response) => {
                let TokenResponse { tokens, user } = response.json().await?;
                self.set_tokens(Some(tokens));
                tracing::info!(user_id = %user.id, "session refreshed");
                self.events.emit(AuthEvent::TokenRefreshed(user.clone()));
                Ok(Some(user))
            }
            Err(e) if is_refresh_rejection(&e) => {
                tracing::info!(error = %e, "refresh token refused, clearing session");
                self.set_tokens(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError> {
        let query = Query::table(ProfileRow::TABLE).eq("id", user_id).limit(1);
        let rows = self.select(&query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn select(&self, query: &Query) -> Result<Vec<serde_json::Value>, BackendError> {
        tracing::debug!(table = query.table_name(), "select");
        let response = self.send_authorized(|| self.select_request(query)).await?;
        Ok(response.json().await?)
    }

    async fn rpc(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        tracing::debug!(rpc = name, "rpc call");
        let url = self.config.rest_url(&format!("rpc/{name}"));
        let response = self
            .send_authorized(|| self.http.post(&url).json(&args))
            .await?;
        Ok(response.json().await?)
    }

    fn subscribe_auth(&self) -> AuthEvents {
        self.events.subscribe()
    }
}
