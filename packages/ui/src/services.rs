//! Composition root for the client services.
//!
//! Everything is built once here and handed out by reference; there are no
//! globals. The view layer owns the lifecycle: it calls [`Services::start`]
//! once, sends [`AppCommand`]s, drives the long-running loops, and calls
//! [`Services::dispose`] when the root unmounts.

use api::{AuthEvent, Backend};
use futures::channel::oneshot;
use futures::StreamExt;
use std::cell::Cell;
use std::rc::Rc;
use store::LocalCache;

use crate::app::AppController;
use crate::config::AppConfig;
use crate::error::ListenerError;
use crate::history::History;
use crate::notify::{Notifier, Surface, ToastLevel};
use crate::pages::standard_registry;
use crate::route::Route;
use crate::router::{NavigationOutcome, Router};
use crate::session::{AuthSession, ListenerId};
use crate::timer::sleep;

/// Intents raised by the view layer.
#[derive(Debug)]
pub enum AppCommand {
    Navigate(Route),
    Login {
        email: String,
        password: String,
        reply: Option<oneshot::Sender<Result<(), String>>>,
    },
    Logout,
    /// Re-render the route shown on an error screen, skipping fresh cache entries.
    Retry(Route),
    Reload,
    /// The browser moved through its history (popstate).
    HistoryChanged,
    Auth(AuthEvent),
}

pub struct Services<B> {
    pub config: AppConfig,
    pub backend: Rc<B>,
    pub session: Rc<AuthSession<B>>,
    pub cache: Rc<LocalCache>,
    pub router: Rc<Router<B>>,
    pub app: Rc<AppController<B>>,
    notifier: Rc<dyn Notifier>,
    render_listener: Cell<Option<ListenerId>>,
}

impl<B: Backend + 'static> Services<B> {
    pub fn new(
        backend: B,
        coordinator_emails: Vec<String>,
        history: Rc<dyn History>,
        surface: Rc<dyn Surface>,
        notifier: Rc<dyn Notifier>,
        config: AppConfig,
    ) -> Self {
        let backend = Rc::new(backend);
        let session = Rc::new(AuthSession::new(backend.clone(), coordinator_emails));
        let cache = Rc::new(LocalCache::new(config.cache.clone()));
        let router = Rc::new(Router::new(
            session.clone(),
            history,
            notifier.clone(),
            config.navigation_timeout(),
            config.debounce(),
        ));
        let app = Rc::new(AppController::new(
            standard_registry(),
            backend.clone(),
            session.clone(),
            cache.clone(),
            surface,
            notifier.clone(),
            config.render_timeout(),
            config.login_redirect_delay(),
        ));
        Self {
            config,
            backend,
            session,
            cache,
            router,
            app,
            notifier,
            render_listener: Cell::new(None),
        }
    }

    /// Restore the session, wire the controller to the router, show the first page.
    pub async fn start(&self) -> NavigationOutcome {
        let user = self.session.initialize().await;
        tracing::info!(signed_in = user.is_some(), "starting client");
        self.app.init();
        if self.render_listener.get().is_none() {
            let app = self.app.clone();
            let id = self.router.subscribe(move |route| {
                let app = app.clone();
                async move {
                    app.render_page(route).await;
                    Ok::<(), ListenerError>(())
                }
            });
            self.render_listener.set(Some(id));
        }
        self.router.init().await
    }

    pub async fn handle(&self, command: AppCommand) {
        match command {
            AppCommand::Navigate(route) => {
                if let Some(route) = self.router.navigate(route).await.route() {
                    self.prefetch_after_idle(route).await;
                }
            }
            AppCommand::Login {
                email,
                password,
                reply,
            } => {
                let result = self.session.login(&email, &password).await;
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "login failed");
                    self.notifier.toast(ToastLevel::Error, &e.to_string());
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result.map(|_| ()).map_err(|e| e.to_string()));
                }
            }
            AppCommand::Logout => {
                if let Err(e) = self.session.logout().await {
                    tracing::warn!(error = %e, "backend sign-out failed, signed out locally");
                }
            }
            AppCommand::Retry(route) => self.retry(route).await,
            AppCommand::Reload => self.router.reload(),
            AppCommand::HistoryChanged => {
                self.router.handle_history_change().await;
            }
            AppCommand::Auth(event) => self.session.apply_event(event).await,
        }
    }

    /// Re-render the current route from the backend. A route that is no
    /// longer current, or no longer allowed, goes through a full navigation.
    async fn retry(&self, route: Route) {
        if route != self.router.current_route() || !self.router.can_access(route) {
            tracing::debug!(route = %route, "retry takes a full navigation");
            self.router.navigate(route).await;
            return;
        }
        self.notifier.show_loading();
        let outcome = self.router.exclusive(self.app.refresh(route)).await;
        self.notifier.hide_loading();
        match outcome {
            Some(outcome) => tracing::debug!(?outcome, "retried"),
            None => tracing::debug!(route = %route, "retry dropped, navigation in progress"),
        }
    }

    /// Forward the backend's auth stream into the session until it closes.
    pub async fn pump_auth_events(&self) {
        let mut events = self.backend.subscribe_auth();
        while let Some(event) = events.next().await {
            self.session.apply_event(event).await;
        }
        tracing::debug!("auth event stream closed");
    }

    /// Periodic eviction of expired cache entries. Never returns.
    pub async fn run_cache_sweeper(&self) {
        loop {
            sleep(self.config.sweep_interval()).await;
            let evicted = self.cache.sweep();
            if evicted > 0 {
                tracing::debug!(evicted, "cache sweep");
            }
        }
    }

    /// Wait for the user to settle on `route`, then warm its likely successors.
    pub async fn prefetch_after_idle(&self, route: Route) {
        sleep(self.config.prefetch_delay()).await;
        if self.router.current_route() == route && !self.router.is_navigating() {
            let warmed = self.app.prefetch_likely_next(route).await;
            tracing::debug!(route = %route, warmed, "prefetched");
        }
    }

    pub fn toast_error(&self, message: &str) {
        self.notifier.toast(ToastLevel::Error, message);
    }

    pub fn dispose(&self) {
        if let Some(id) = self.render_listener.take() {
            self.router.unsubscribe(id);
        }
        self.router.dispose();
        self.app.dispose();
        self.session.dispose();
        tracing::info!("client disposed");
    }
}
