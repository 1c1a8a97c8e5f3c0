//! # API crate: backend collaborator for the clinic client
//!
//! Every piece of persistence, authentication and business logic lives in the
//! hosted backend; this crate is the only place the client talks to it. The
//! [`Backend`] trait is the seam the rest of the workspace programs against,
//! so the session holder, router and pages can run against the real REST
//! service in the browser or against [`MemoryBackend`] in tests.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Auth identities, tokens and the auth event stream |
//! | [`config`] | [`BackendConfig`] loaded from the environment (or baked in on wasm) |
//! | [`error`] | [`BackendError`], shared by every backend call |
//! | [`models`] | Profile rows and the clinic's domain records |
//! | [`query`] | PostgREST-style [`Query`] builder |
//! | [`rest`] | [`RestBackend`], the `reqwest` implementation |
//! | [`memory`] | [`MemoryBackend`], in-memory implementation with failure injection |

use std::future::Future;

pub mod auth;
pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod query;
pub mod rest;

pub use auth::{AuthEvent, AuthEvents, AuthTokens, AuthUser};
pub use config::BackendConfig;
pub use error::BackendError;
pub use memory::MemoryBackend;
pub use models::{
    Anamnesis, Appointment, Client, ClientRef, Collaborator, InventoryItem, ProfileRow,
    Prontuario, Record, SupervisionSession, TestCatalogEntry, Transaction, TransactionKind,
};
pub use query::{Order, Query};
pub use rest::RestBackend;

/// Async interface to the hosted backend.
///
/// Futures are not `Send`: the client runs on a single-threaded event loop.
pub trait Backend {
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthUser, BackendError>>;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> impl Future<Output = Result<AuthUser, BackendError>>;

    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>>;

    /// The identity behind the current session, if any.
    fn current_user(&self) -> impl Future<Output = Result<Option<AuthUser>, BackendError>>;

    /// Renew the current session, emitting [`AuthEvent::TokenRefreshed`].
    ///
    /// `Ok(None)` means there is no session left to renew.
    fn refresh_session(&self) -> impl Future<Output = Result<Option<AuthUser>, BackendError>>;

    fn fetch_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<ProfileRow>, BackendError>>;

    fn select(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, BackendError>>;

    /// Call a named remote procedure (e.g. `promote_user_role`, `dashboard_stats`).
    fn rpc(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, BackendError>>;

    /// Subscribe to auth events emitted after this call.
    fn subscribe_auth(&self) -> AuthEvents;
}
