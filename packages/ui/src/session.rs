//! # Auth session holder
//!
//! [`AuthSession`] is the single source of truth for who is signed in and what
//! they may do. It bridges the backend's identity (an [`AuthUser`]) to an
//! application [`Profile`] and answers role and permission queries from the
//! cached result.
//!
//! ## Profile resolution
//!
//! After the backend confirms an identity, the profile row is read. A missing
//! row, or a failed read, never fails the session. A default profile is
//! synthesized instead:
//!
//! - the role is coordinator when the email is in the configured allowlist,
//!   otherwise intern;
//! - the name comes from `user_metadata.name`, then `user_metadata.full_name`,
//!   then the local part of the email.
//!
//! ## Change notification
//!
//! ## Session end
//!
//! The backend refusing the session on any call means the user is signed out:
//! [`AuthSession::expire`] clears the user so every listener hears about it.
//! [`AuthSession::logout`] clears the user even when the backend could not be
//! told.
//!
//! Callbacks registered with [`AuthSession::on_auth_state_change`] run in
//! insertion order, awaited one after another, once per actual change of the
//! resolved user. A login followed by the backend's own `SignedIn` event
//! therefore notifies only once.

use api::{AuthEvent, AuthUser, Backend, ProfileRow};
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use crate::error::AuthError;
use crate::permissions::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub role: Role,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub profile: Profile,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        &self.profile.name
    }
}

/// Before/after pair delivered to auth listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub previous: Option<SessionUser>,
    pub current: Option<SessionUser>,
}

impl AuthChange {
    pub fn signed_in(&self) -> bool {
        self.previous.is_none() && self.current.is_some()
    }

    pub fn signed_out(&self) -> bool {
        self.previous.is_some() && self.current.is_none()
    }
}

type AuthListener = Rc<dyn Fn(AuthChange) -> LocalBoxFuture<'static, ()>>;

pub struct AuthSession<B> {
    backend: Rc<B>,
    coordinator_emails: Vec<String>,
    user: RefCell<Option<SessionUser>>,
    listeners: RefCell<Vec<(ListenerId, AuthListener)>>,
    next_listener: Cell<u64>,
}

impl<B: Backend> AuthSession<B> {
    pub fn new(backend: Rc<B>, coordinator_emails: Vec<String>) -> Self {
        Self {
            backend,
            coordinator_emails: coordinator_emails
                .into_iter()
                .map(|e| e.trim().to_lowercase())
                .collect(),
            user: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    pub fn backend(&self) -> &Rc<B> {
        &self.backend
    }

    /// Resolve the session left over from a previous visit, if any.
    ///
    /// The stored session is renewed first so a stale access token is
    /// replaced before the first page loads.
    pub async fn initialize(&self) -> Option<SessionUser> {
        match self.restore().await {
            Ok(user) => {
                self.set_user(user.clone()).await;
                user
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not restore session");
                None
            }
        }
    }

    async fn restore(&self) -> Result<Option<SessionUser>, AuthError> {
        let identity = match self.backend.refresh_session().await {
            Ok(Some(identity)) => Some(identity),
            Ok(None) => self.backend.current_user().await?,
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed, trying stored token");
                self.backend.current_user().await?
            }
        };
        match identity {
            Some(identity) => Ok(Some(self.resolve(&identity).await)),
            None => Ok(None),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let identity = self.backend.sign_in_with_password(email, password).await?;
        let user = self.resolve(&identity).await;
        tracing::info!(user_id = %user.id, role = %user.profile.role, "login succeeded");
        self.set_user(Some(user.clone())).await;
        Ok(user)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SessionUser, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let identity = self.backend.sign_up(email, password, name.trim()).await?;
        let user = self.resolve(&identity).await;
        self.set_user(Some(user.clone())).await;
        Ok(user)
    }

    /// Sign out; the local session ends even if the backend call fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let result = self.backend.sign_out().await;
        tracing::info!("logged out");
        self.set_user(None).await;
        result.map_err(AuthError::from)
    }

    /// The backend rejected the session: sign the user out locally.
    pub async fn expire(&self) {
        if !self.is_authenticated() {
            return;
        }
        tracing::warn!("session rejected by backend, signing out");
        self.set_user(None).await;
    }

    /// Ask the backend who is signed in and resolve their profile.
    pub async fn get_current_user(&self) -> Result<Option<SessionUser>, AuthError> {
        match self.backend.current_user().await? {
            Some(identity) => Ok(Some(self.resolve(&identity).await)),
            None => Ok(None),
        }
    }

    /// React to an event from the backend's auth stream.
    pub async fn apply_event(&self, event: AuthEvent) {
        tracing::debug!(?event, "auth event");
        let user = match event.user() {
            Some(identity) => Some(self.resolve(identity).await),
            None => None,
        };
        self.set_user(user).await;
    }

    async fn resolve(&self, identity: &AuthUser) -> SessionUser {
        let email = identity.email.clone().unwrap_or_default();
        let profile = match self.backend.fetch_profile(&identity.id).await {
            Ok(Some(row)) => self.profile_from_row(row, identity),
            Ok(None) => {
                tracing::info!(user_id = %identity.id, "no profile row, using default profile");
                self.default_profile(identity)
            }
            Err(e) => {
                tracing::warn!(user_id = %identity.id, error = %e, "profile lookup failed, using default profile");
                self.default_profile(identity)
            }
        };
        SessionUser {
            id: identity.id.clone(),
            email,
            profile,
        }
    }

    fn profile_from_row(&self, row: ProfileRow, identity: &AuthUser) -> Profile {
        let fallback = self.default_profile(identity);
        Profile {
            role: Role::parse(&row.role),
            name: row
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(fallback.name),
            email: row.email.unwrap_or(fallback.email),
        }
    }

    fn default_profile(&self, identity: &AuthUser) -> Profile {
        let email = identity.email.clone().unwrap_or_default();
        let role = if self.coordinator_emails.contains(&email.to_lowercase()) {
            Role::Coordinator
        } else {
            Role::Intern
        };
        let name = identity
            .metadata_str("name")
            .or_else(|| identity.metadata_str("full_name"))
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        Profile { role, name, email }
    }

    async fn set_user(&self, user: Option<SessionUser>) {
        if *self.user.borrow() == user {
            return;
        }
        let previous = self.user.replace(user.clone());
        self.notify(AuthChange {
            previous,
            current: user,
        })
        .await;
    }

    async fn notify(&self, change: AuthChange) {
        let listeners: Vec<AuthListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(change.clone()).await;
        }
    }

    pub fn on_auth_state_change<F, Fut>(&self, callback: F) -> ListenerId
    where
        F: Fn(AuthChange) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        let listener: AuthListener = Rc::new(move |change| Box::pin(callback(change)));
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    /// Drop every listener.
    pub fn dispose(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    pub fn user_role(&self) -> Option<Role> {
        self.user.borrow().as_ref().map(|u| u.profile.role.clone())
    }

    pub fn user_name(&self) -> Option<String> {
        self.user.borrow().as_ref().map(|u| u.profile.name.clone())
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.user
            .borrow()
            .as_ref()
            .is_some_and(|u| u.profile.role.allows(permission))
    }

    pub fn is_coordinator(&self) -> bool {
        self.user_role() == Some(Role::Coordinator)
    }

    pub fn is_staff(&self) -> bool {
        self.user_role() == Some(Role::Staff)
    }

    pub fn is_intern(&self) -> bool {
        self.user_role() == Some(Role::Intern)
    }
}
