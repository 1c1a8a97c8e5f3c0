//! # App controller
//!
//! Owns the route to page table, mounts the shared layout once, and swaps the
//! page shown inside it on every route change. A failing or slow page is
//! contained: it gets an error screen, never a crash.
//!
//! A render that finds the session rejected by the backend signs the user
//! out instead of showing an error screen; the router then takes them to the
//! login page.
//!
//! Every render gets its own [`CancellationToken`]. The token is cancelled
//! when the page is replaced or when its render loses the race against
//! `render_timeout`, and the render future is dropped, so in-flight backend
//! calls stop with it.

use api::Backend;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use store::LocalCache;
use tokio_util::sync::CancellationToken;

use crate::content::PageContent;
use crate::notify::{Notifier, Surface, ToastLevel};
use crate::page::{Page, PageContext, PageRegistry};
use crate::prefetch::likely_next;
use crate::route::{Route, ALL_ROUTES};
use crate::screen::{ErrorScreen, LayoutModel, NavEntry, Screen};
use crate::session::{AuthSession, ListenerId};
use crate::timer::timeout;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(Route),
    Failed { route: Route, message: String },
    TimedOut(Route),
    /// A newer render started before this one finished.
    Superseded(Route),
    /// The backend rejected the session while rendering.
    SignedOut(Route),
}

struct ActivePage<B> {
    route: Route,
    page: Box<dyn Page<B>>,
    cancel: CancellationToken,
}

pub struct AppController<B> {
    registry: PageRegistry<B>,
    backend: Rc<B>,
    session: Rc<AuthSession<B>>,
    cache: Rc<LocalCache>,
    surface: Rc<dyn Surface>,
    notifier: Rc<dyn Notifier>,
    render_timeout: Duration,
    login_redirect_delay: Duration,
    layout: RefCell<Option<LayoutModel>>,
    layout_mounts: Cell<usize>,
    page: RefCell<Option<ActivePage<B>>>,
    render_seq: Cell<u64>,
    auth_listener: Cell<Option<ListenerId>>,
}

impl<B: Backend + 'static> AppController<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: PageRegistry<B>,
        backend: Rc<B>,
        session: Rc<AuthSession<B>>,
        cache: Rc<LocalCache>,
        surface: Rc<dyn Surface>,
        notifier: Rc<dyn Notifier>,
        render_timeout: Duration,
        login_redirect_delay: Duration,
    ) -> Self {
        Self {
            registry,
            backend,
            session,
            cache,
            surface,
            notifier,
            render_timeout,
            login_redirect_delay,
            layout: RefCell::new(None),
            layout_mounts: Cell::new(0),
            page: RefCell::new(None),
            render_seq: Cell::new(0),
            auth_listener: Cell::new(None),
        }
    }

    /// Toast feedback for sign-in and sign-out. Sign-out also drops cached data.
    pub fn init(&self) {
        if self.auth_listener.get().is_some() {
            return;
        }
        let notifier = self.notifier.clone();
        let cache = self.cache.clone();
        let id = self.session.on_auth_state_change(move |change| {
            if let Some(user) = change.current.as_ref().filter(|_| change.signed_in()) {
                notifier.toast(
                    ToastLevel::Success,
                    &format!("Signed in as {}", user.display_name()),
                );
            } else if change.signed_out() {
                cache.clear();
                notifier.toast(ToastLevel::Info, "Signed out");
            }
            async {}
        });
        self.auth_listener.set(Some(id));
    }

    pub fn current_route(&self) -> Option<Route> {
        self.page.borrow().as_ref().map(|p| p.route)
    }

    pub fn layout(&self) -> Option<LayoutModel> {
        self.layout.borrow().clone()
    }

    /// How many times the layout was built from scratch.
    pub fn layout_mounts(&self) -> usize {
        self.layout_mounts.get()
    }

    fn context(&self, route: Route, cancel: CancellationToken, force_refresh: bool) -> PageContext<B> {
        PageContext {
            backend: self.backend.clone(),
            session: self.session.clone(),
            cache: self.cache.clone(),
            route,
            cancel,
            force_refresh,
        }
    }

    fn teardown(&self) {
        if let Some(mut active) = self.page.borrow_mut().take() {
            tracing::debug!(route = %active.route, "destroying page");
            active.cancel.cancel();
            active.page.destroy();
        }
    }

    fn nav_entries(&self) -> Vec<NavEntry> {
        let user = self.session.current_user();
        ALL_ROUTES
            .into_iter()
            .filter(|r| r.uses_layout() && r.access().allows(user.as_ref()))
            .map(|route| NavEntry {
                route,
                label: route.label(),
            })
            .collect()
    }

    fn mount_layout(&self, route: Route) {
        let mut layout = self.layout.borrow_mut();
        if layout.is_none() {
            self.layout_mounts.set(self.layout_mounts.get() + 1);
            tracing::debug!("mounting layout");
        }
        let (user_name, role_label) = match self.session.current_user() {
            Some(user) => (user.profile.name.clone(), user.profile.role.label().to_string()),
            None => (String::new(), String::new()),
        };
        *layout = Some(LayoutModel {
            user_name,
            role_label,
            nav: self.nav_entries(),
            active: route,
        });
    }

    fn unmount_layout(&self) {
        if self.layout.borrow_mut().take().is_some() {
            tracing::debug!("unmounting layout");
        }
    }

    fn present(&self, route: Route, content: PageContent) {
        let layout = self.layout.borrow().clone();
        let screen = match layout {
            Some(layout) if route.uses_layout() => Screen::Shell { layout, content },
            _ => Screen::Standalone(content),
        };
        self.surface.show(screen);
    }

    fn show_error(&self, route: Route, title: &str, message: String) {
        self.surface.show(Screen::Error(ErrorScreen {
            title: title.to_string(),
            message,
            retry_route: Some(route),
            redirect_to_login_after: (route != Route::Login).then_some(self.login_redirect_delay),
            seq: self.render_seq.get(),
        }));
    }

    pub async fn render_page(&self, route: Route) -> RenderOutcome {
        self.render(route, false).await
    }

    /// Render again, bypassing fresh cache entries.
    pub async fn refresh(&self, route: Route) -> RenderOutcome {
        self.render(route, true).await
    }

    async fn render(&self, requested: Route, force_refresh: bool) -> RenderOutcome {
        let route = if requested != Route::Login && !self.session.is_authenticated() {
            tracing::info!(requested = %requested, "not signed in, rendering login");
            Route::Login
        } else {
            requested
        };
        let seq = self.render_seq.get() + 1;
        self.render_seq.set(seq);

        self.teardown();
        if route.uses_layout() {
            self.mount_layout(route);
        } else {
            self.unmount_layout();
        }

        let factory = match self.registry.factory(route) {
            Ok(factory) => factory,
            Err(e) => {
                tracing::error!(route = %route, error = %e, "no page for route");
                let message = e.to_string();
                self.show_error(route, "Page not found", message.clone());
                return RenderOutcome::Failed { route, message };
            }
        };

        let cancel = CancellationToken::new();
        let ctx = self.context(route, cancel.clone(), force_refresh);
        let mut page = factory();
        let result = timeout(self.render_timeout, page.render(&ctx)).await;

        if self.render_seq.get() != seq {
            cancel.cancel();
            page.destroy();
            return RenderOutcome::Superseded(route);
        }

        match result {
            Ok(Ok(content)) => {
                self.present(route, content);
                *self.page.borrow_mut() = Some(ActivePage { route, page, cancel });
                tracing::info!(route = %route, "page rendered");
                RenderOutcome::Rendered(route)
            }
            Ok(Err(e)) if e.is_not_authenticated() => {
                cancel.cancel();
                page.destroy();
                self.session_rejected(route).await;
                RenderOutcome::SignedOut(route)
            }
            Ok(Err(e)) => {
                cancel.cancel();
                page.destroy();
                tracing::error!(route = %route, error = %e, "page render failed");
                let message = e.to_string();
                self.show_error(route, "This page could not be loaded", message.clone());
                RenderOutcome::Failed { route, message }
            }
            Err(elapsed) => {
                cancel.cancel();
                page.destroy();
                tracing::error!(route = %route, %elapsed, "page render timed out");
                self.show_error(
                    route,
                    "This page is taking too long",
                    format!("{} did not load within {:?}.", route.label(), elapsed.0),
                );
                RenderOutcome::TimedOut(route)
            }
        }
    }

    async fn session_rejected(&self, route: Route) {
        tracing::warn!(route = %route, "session rejected by backend");
        if self.session.is_authenticated() {
            self.notifier.toast(
                ToastLevel::Warning,
                "Your session has expired. Please sign in again.",
            );
        }
        self.session.expire().await;
    }

    /// Warm the cache for the pages usually opened after `route`.
    /// Returns how many pages were prefetched.
    pub async fn prefetch_likely_next(&self, route: Route) -> usize {
        let user = self.session.current_user();
        let mut warmed = 0;
        for &next in likely_next(route) {
            if !next.access().allows(user.as_ref()) {
                continue;
            }
            let Ok(factory) = self.registry.factory(next) else {
                continue;
            };
            let mut page = factory();
            let ctx = self.context(next, CancellationToken::new(), false);
            match timeout(self.render_timeout, page.prefetch(&ctx)).await {
                Ok(Ok(())) => warmed += 1,
                Ok(Err(e)) if e.is_not_authenticated() => {
                    page.destroy();
                    self.session_rejected(next).await;
                    return warmed;
                }
                Ok(Err(e)) => tracing::debug!(route = %next, error = %e, "prefetch failed"),
                Err(_) => {
                    ctx.cancel.cancel();
                    tracing::debug!(route = %next, "prefetch timed out");
                }
            }
            page.destroy();
        }
        warmed
    }

    pub fn dispose(&self) {
        self.teardown();
        self.unmount_layout();
        if let Some(id) = self.auth_listener.take() {
            self.session.remove_listener(id);
        }
    }
}
