//! # Router
//!
//! Turns navigation intents into permission-checked, URL-synchronised route
//! changes and fans the new route out to subscribers.
//!
//! At most one navigation is in flight. A call made while another is running
//! returns [`NavigationOutcome::Dropped`] without queueing. The in-flight flag
//! is owned by a guard, so it is cleared on every exit path, including when
//! the navigation future itself is dropped.
//!
//! An auth change that arrives while a navigation is in flight (a page
//! finding its session rejected mid-render, say) is held and followed as soon
//! as that navigation settles.
//!
//! Denied or unknown targets are replaced by a fallback (dashboard when signed
//! in, login otherwise), checked once more, and replaced by login if that is
//! still denied.

use api::Backend;
use futures::future::{try_join_all, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::error::ListenerError;
use crate::history::{History, HistoryMode, PAGE_PARAM};
use crate::notify::{Notifier, ToastLevel};
use crate::route::{Access, Route};
use crate::session::{AuthChange, AuthSession, ListenerId};
use crate::timer::{timeout, Debouncer};

pub type RouteListener = Rc<dyn Fn(Route) -> LocalBoxFuture<'static, Result<(), ListenerError>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Navigated(Route),
    /// The requested target was denied or unknown.
    Redirected { requested: String, to: Route },
    /// Another navigation was in flight.
    Dropped,
    TimedOut(Route),
    ListenerFailed(Route),
}

impl NavigationOutcome {
    /// The route that became current, if the navigation was accepted.
    pub fn route(&self) -> Option<Route> {
        match self {
            NavigationOutcome::Navigated(r)
            | NavigationOutcome::TimedOut(r)
            | NavigationOutcome::ListenerFailed(r) => Some(*r),
            NavigationOutcome::Redirected { to, .. } => Some(*to),
            NavigationOutcome::Dropped => None,
        }
    }
}

struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(InFlight(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct Router<B> {
    session: Rc<AuthSession<B>>,
    history: Rc<dyn History>,
    notifier: Rc<dyn Notifier>,
    navigation_timeout: Duration,
    current: Cell<Route>,
    navigating: Cell<bool>,
    listeners: RefCell<Vec<(ListenerId, RouteListener)>>,
    next_listener: Cell<u64>,
    history_debounce: Debouncer,
    auth_debounce: Debouncer,
    auth_listener: Cell<Option<ListenerId>>,
    deferred_auth: RefCell<Option<AuthChange>>,
}

impl<B: Backend + 'static> Router<B> {
    pub fn new(
        session: Rc<AuthSession<B>>,
        history: Rc<dyn History>,
        notifier: Rc<dyn Notifier>,
        navigation_timeout: Duration,
        debounce: Duration,
    ) -> Self {
        Self {
            session,
            history,
            notifier,
            navigation_timeout,
            current: Cell::new(Route::Login),
            navigating: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            history_debounce: Debouncer::new(debounce),
            auth_debounce: Debouncer::new(debounce),
            auth_listener: Cell::new(None),
            deferred_auth: RefCell::new(None),
        }
    }

    pub fn current_route(&self) -> Route {
        self.current.get()
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating.get()
    }

    pub fn can_access(&self, route: Route) -> bool {
        route.access().allows(self.session.current_user().as_ref())
    }

    /// `false` for names outside the route table.
    pub fn can_access_route(&self, name: &str) -> bool {
        Route::from_name(name).is_some_and(|route| self.can_access(route))
    }

    pub fn initial_route(&self) -> Route {
        if self.session.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Login
        }
    }

    pub fn route_from_url(&self) -> Option<Route> {
        self.history
            .current_query_param(PAGE_PARAM)
            .and_then(|name| Route::from_name(&name))
    }

    fn fallback_route(&self) -> Route {
        self.initial_route()
    }

    fn resolve(&self, target: Option<Route>) -> Route {
        if target == Some(Route::Login) && self.session.is_authenticated() {
            return Route::Dashboard;
        }
        if let Some(route) = target.filter(|r| self.can_access(*r)) {
            return route;
        }
        let fallback = self.fallback_route();
        if self.can_access(fallback) {
            fallback
        } else {
            Route::Login
        }
    }

    pub async fn navigate(&self, route: Route) -> NavigationOutcome {
        self.navigate_with(route.name(), Some(route), Some(HistoryMode::Push))
            .await
    }

    /// Navigate by route name; unknown names take the fallback.
    pub async fn navigate_to(&self, name: &str) -> NavigationOutcome {
        self.navigate_with(name, Route::from_name(name), Some(HistoryMode::Push))
            .await
    }

    async fn navigate_with(
        &self,
        requested: &str,
        target: Option<Route>,
        mode: Option<HistoryMode>,
    ) -> NavigationOutcome {
        let outcome = self.navigate_once(requested, target, mode).await;
        if outcome != NavigationOutcome::Dropped {
            self.follow_deferred_auth().await;
        }
        outcome
    }

    /// Run `work` under the in-flight guard, as a navigation would.
    /// `None` when a navigation is already running.
    pub async fn exclusive<T>(&self, work: impl Future<Output = T>) -> Option<T> {
        let output = {
            let Some(_in_flight) = InFlight::enter(&self.navigating) else {
                tracing::warn!("navigation in progress, dropping exclusive work");
                return None;
            };
            work.await
        };
        self.follow_deferred_auth().await;
        Some(output)
    }

    async fn follow_deferred_auth(&self) {
        while let Some(change) = self.deferred_auth.take() {
            if let Some(outcome) = self.follow_auth_change(change).await {
                tracing::debug!(?outcome, "deferred auth change followed");
            }
        }
    }

    async fn navigate_once(
        &self,
        requested: &str,
        target: Option<Route>,
        mode: Option<HistoryMode>,
    ) -> NavigationOutcome {
        let Some(_in_flight) = InFlight::enter(&self.navigating) else {
            tracing::warn!(requested, "navigation already in progress, dropping");
            return NavigationOutcome::Dropped;
        };

        let route = self.resolve(target);
        if target != Some(route) {
            tracing::info!(requested, to = %route, "navigation redirected");
        }
        self.current.set(route);
        if let Some(mode) = mode {
            self.history.write(route, mode);
        }

        self.notifier.show_loading();
        let listeners: Vec<RouteListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        let notified = try_join_all(listeners.iter().map(|l| l(route)));

        match timeout(self.navigation_timeout, notified).await {
            Ok(Ok(_)) => {
                self.notifier.hide_loading();
                tracing::info!(route = %route, "navigated");
                if target == Some(route) {
                    NavigationOutcome::Navigated(route)
                } else {
                    NavigationOutcome::Redirected {
                        requested: requested.to_string(),
                        to: route,
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::error!(route = %route, error = %e, "route listener failed");
                self.notifier.hide_loading();
                self.notifier
                    .toast(ToastLevel::Error, &format!("Could not open {}: {e}", route.label()));
                NavigationOutcome::ListenerFailed(route)
            }
            Err(elapsed) => {
                tracing::error!(route = %route, %elapsed, "navigation timed out");
                self.notifier.hide_loading();
                self.notifier.show_blocking_error(
                    "The page is taking too long to load. Reload to try again.",
                );
                NavigationOutcome::TimedOut(route)
            }
        }
    }

    /// Resolve the startup route and start following auth changes.
    pub async fn init(self: &Rc<Self>) -> NavigationOutcome {
        if self.auth_listener.get().is_none() {
            let weak: Weak<Self> = Rc::downgrade(self);
            let id = self.session.on_auth_state_change(move |change| {
                let weak = weak.clone();
                async move {
                    if let Some(router) = weak.upgrade() {
                        router.handle_auth_change(change).await;
                    }
                }
            });
            self.auth_listener.set(Some(id));
        }

        match self.history.current_query_param(PAGE_PARAM) {
            Some(name) => {
                self.navigate_with(&name, Route::from_name(&name), Some(HistoryMode::Replace))
                    .await
            }
            None => {
                let route = self.initial_route();
                self.navigate_with(route.name(), Some(route), Some(HistoryMode::Replace))
                    .await
            }
        }
    }

    /// Back/forward. `None` when debounced away or already on the URL's route.
    pub async fn handle_history_change(&self) -> Option<NavigationOutcome> {
        if !self.history_debounce.settle().await {
            return None;
        }
        let name = self.history.current_query_param(PAGE_PARAM);
        let target = match &name {
            Some(name) => Route::from_name(name),
            None => Some(self.initial_route()),
        };
        if target == Some(self.current.get()) {
            return None;
        }
        let requested = name.unwrap_or_else(|| self.initial_route().name().to_string());
        Some(self.navigate_with(&requested, target, None).await)
    }

    async fn handle_auth_change(&self, change: AuthChange) -> Option<NavigationOutcome> {
        if !self.auth_debounce.settle().await {
            return None;
        }
        if self.navigating.get() {
            tracing::debug!("navigation in flight, deferring auth change");
            *self.deferred_auth.borrow_mut() = Some(change);
            return None;
        }
        self.follow_auth_change(change).await
    }

    async fn follow_auth_change(&self, change: AuthChange) -> Option<NavigationOutcome> {
        let current = self.current.get();
        let target = if !self.session.is_authenticated() {
            (current.access() != Access::Public).then_some(Route::Login)
        } else if current == Route::Login {
            Some(Route::Dashboard)
        } else if !self.can_access(current) {
            Some(self.fallback_route())
        } else {
            let previous = change.previous.as_ref().map(|u| &u.id);
            let now = change.current.as_ref().map(|u| &u.id);
            // A different user on the same page still needs a fresh render.
            (previous != now).then_some(current)
        }?;
        tracing::debug!(from = %current, to = %target, "auth change re-navigates");
        Some(
            self.navigate_once(target.name(), Some(target), Some(HistoryMode::Replace))
                .await,
        )
    }

    pub fn subscribe<F, Fut>(&self, listener: F) -> ListenerId
    where
        F: Fn(Route) -> Fut + 'static,
        Fut: Future<Output = Result<(), ListenerError>> + 'static,
    {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        let listener: RouteListener = Rc::new(move |route| Box::pin(listener(route)));
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    pub fn reload(&self) {
        self.history.reload();
    }

    pub fn dispose(&self) {
        self.listeners.borrow_mut().clear();
        if let Some(id) = self.auth_listener.take() {
            self.session.remove_listener(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use crate::permissions::Role;
    use crate::testing::RecordingSurface;
    use crate::timer::sleep;
    use api::{AuthEvent, MemoryBackend, ProfileRow};

    struct Fixture {
        backend: MemoryBackend,
        session: Rc<AuthSession<MemoryBackend>>,
        history: Rc<MemoryHistory>,
        surface: Rc<RecordingSurface>,
        router: Rc<Router<MemoryBackend>>,
    }

    fn fixture(url_page: Option<&str>) -> Fixture {
        let backend = MemoryBackend::new();
        let session = Rc::new(AuthSession::new(Rc::new(backend.clone()), Vec::new()));
        let history = Rc::new(MemoryHistory::new(url_page));
        let surface = Rc::new(RecordingSurface::default());
        let router = Rc::new(Router::new(
            session.clone(),
            history.clone(),
            surface.clone(),
            Duration::from_secs(10),
            Duration::from_millis(100),
        ));
        Fixture {
            backend,
            session,
            history,
            surface,
            router,
        }
    }

    fn record_routes(router: &Router<MemoryBackend>) -> Rc<RefCell<Vec<Route>>> {
        let routes: Rc<RefCell<Vec<Route>>> = Rc::default();
        let r = routes.clone();
        router.subscribe(move |route| {
            r.borrow_mut().push(route);
            async { Ok::<(), ListenerError>(()) }
        });
        routes
    }

    async fn sign_in(f: &Fixture, role: &str) {
        let user = f.backend.add_user("ana@clinic.com", "pw", Some("Ana"));
        f.backend.set_profile(ProfileRow {
            id: user.id,
            role: role.to_string(),
            name: None,
            email: None,
        });
        f.session.login("ana@clinic.com", "pw").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_route_is_denied_and_falls_back() {
        let f = fixture(None);
        assert!(!f.router.can_access_route("billing"));
        assert_eq!(
            f.router.navigate_to("billing").await,
            NavigationOutcome::Redirected {
                requested: "billing".into(),
                to: Route::Login
            }
        );

        sign_in(&f, "staff").await;
        assert!(!f.router.can_access_route("billing"));
        assert_eq!(
            f.router.navigate_to("billing").await.route(),
            Some(Route::Dashboard)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_anonymous_dashboard_resolves_to_login() {
        let f = fixture(None);
        let outcome = f.router.navigate(Route::Dashboard).await;
        assert_eq!(outcome.route(), Some(Route::Login));
        assert_eq!(f.router.current_route(), Route::Login);
        assert_eq!(f.history.current_page().as_deref(), Some("login"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_capability_falls_back_to_dashboard() {
        let f = fixture(None);
        sign_in(&f, "intern").await;
        assert!(!f.router.can_access(Route::Financial));
        assert_eq!(
            f.router.navigate(Route::Financial).await,
            NavigationOutcome::Redirected {
                requested: "financial".into(),
                to: Route::Dashboard
            }
        );
        assert_eq!(
            f.router.navigate(Route::Prontuarios).await,
            NavigationOutcome::Navigated(Route::Prontuarios)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_navigation_is_dropped() {
        let f = fixture(None);
        sign_in(&f, "coordinator").await;
        let renders: Rc<RefCell<Vec<Route>>> = Rc::default();
        let r = renders.clone();
        f.router.subscribe(move |route| {
            let r = r.clone();
            async move {
                sleep(Duration::from_millis(50)).await;
                r.borrow_mut().push(route);
                Ok::<(), ListenerError>(())
            }
        });

        let (first, second) = futures::join!(
            f.router.navigate(Route::Clients),
            f.router.navigate(Route::Reports)
        );
        assert_eq!(first, NavigationOutcome::Navigated(Route::Clients));
        assert_eq!(second, NavigationOutcome::Dropped);
        assert_eq!(f.router.current_route(), Route::Clients);
        assert_eq!(*renders.borrow(), vec![Route::Clients]);
        assert!(!f.router.is_navigating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_failure_toasts_and_clears_flag() {
        let f = fixture(None);
        f.router
            .subscribe(|_| async { Err::<(), _>(ListenerError("render exploded".into())) });

        let outcome = f.router.navigate(Route::Login).await;
        assert_eq!(outcome, NavigationOutcome::ListenerFailed(Route::Login));
        assert!(!f.surface.loading.get());
        assert!(f.surface.toast_messages()[0].contains("render exploded"));
        assert!(!f.router.is_navigating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_timeout_shows_blocking_error() {
        let f = fixture(None);
        f.router.subscribe(|_| async {
            futures::future::pending::<()>().await;
            Ok::<(), ListenerError>(())
        });

        let outcome = f.router.navigate(Route::Login).await;
        assert_eq!(outcome, NavigationOutcome::TimedOut(Route::Login));
        assert!(f.surface.blocking_error.borrow().is_some());
        assert!(!f.router.is_navigating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listeners_called_in_registration_order() {
        let f = fixture(None);
        let order: Rc<RefCell<Vec<u8>>> = Rc::default();
        for tag in [1u8, 2, 3] {
            let order = order.clone();
            f.router.subscribe(move |_| {
                order.borrow_mut().push(tag);
                async { Ok::<(), ListenerError>(()) }
            });
        }
        f.router.navigate(Route::Login).await;
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_reads_url_with_replace() {
        let f = fixture(Some("clients"));
        sign_in(&f, "staff").await;
        let outcome = f.router.init().await;
        assert_eq!(outcome, NavigationOutcome::Navigated(Route::Clients));
        assert_eq!(f.history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_without_param_uses_initial_route() {
        let f = fixture(None);
        assert_eq!(
            f.router.init().await,
            NavigationOutcome::Navigated(Route::Login)
        );
        assert_eq!(f.history.current_page().as_deref(), Some("login"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_change_renavigates_without_pushing() {
        let f = fixture(None);
        sign_in(&f, "coordinator").await;
        f.router.navigate(Route::Clients).await;
        f.router.navigate(Route::Reports).await;
        let entries = f.history.len();

        assert!(f.history.back());
        let outcome = f.router.handle_history_change().await;
        assert_eq!(outcome, Some(NavigationOutcome::Navigated(Route::Clients)));
        assert_eq!(f.history.len(), entries);

        // Same route as current: nothing to do.
        assert_eq!(f.router.handle_history_change().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_burst_is_debounced() {
        let f = fixture(None);
        sign_in(&f, "coordinator").await;
        f.router.navigate(Route::Clients).await;
        f.router.navigate(Route::Reports).await;
        f.history.back();

        let later = async {
            sleep(Duration::from_millis(20)).await;
            f.router.handle_history_change().await
        };
        let (first, second) = futures::join!(f.router.handle_history_change(), later);
        assert_eq!(first, None);
        assert_eq!(second, Some(NavigationOutcome::Navigated(Route::Clients)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_changes_drive_navigation() {
        let f = fixture(None);
        f.router.init().await;
        assert_eq!(f.router.current_route(), Route::Login);

        sign_in(&f, "staff").await;
        assert_eq!(f.router.current_route(), Route::Dashboard);

        f.router.navigate(Route::Financial).await;
        f.session.logout().await.unwrap();
        assert_eq!(f.router.current_route(), Route::Login);
    }

    #[tokio::test(start_paused = true)]
    async fn test_authenticated_login_redirects_to_dashboard() {
        let f = fixture(None);
        sign_in(&f, "intern").await;
        assert_eq!(f.session.user_role(), Some(Role::Intern));
        assert_eq!(
            f.router.navigate_to("login").await,
            NavigationOutcome::Redirected {
                requested: "login".into(),
                to: Route::Dashboard
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_detaches_from_session() {
        let f = fixture(None);
        f.router.init().await;
        f.router.dispose();
        sign_in(&f, "staff").await;
        assert_eq!(f.router.current_route(), Route::Login);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_burst_renavigates_once() {
        let f = fixture(None);
        f.router.init().await;
        let ana = f.backend.add_user("ana@clinic.com", "pw", Some("Ana"));
        let bob = f.backend.add_user("bob@clinic.com", "pw", Some("Bob"));
        let routes = record_routes(&f.router);

        let later = async {
            sleep(Duration::from_millis(20)).await;
            f.session.apply_event(AuthEvent::SignedIn(bob)).await;
        };
        futures::join!(f.session.apply_event(AuthEvent::SignedIn(ana)), later);

        assert_eq!(*routes.borrow(), vec![Route::Dashboard]);
        assert_eq!(f.router.current_route(), Route::Dashboard);
        assert_eq!(f.session.current_user().unwrap().email, "bob@clinic.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_user_on_same_page_rerenders_in_place() {
        let f = fixture(None);
        f.router.init().await;
        sign_in(&f, "staff").await;
        f.router.navigate(Route::Clients).await;
        let bob = f.backend.add_user("bob@clinic.com", "pw", Some("Bob"));
        f.backend.set_profile(ProfileRow {
            id: bob.id.clone(),
            role: "staff".into(),
            name: None,
            email: None,
        });
        let routes = record_routes(&f.router);
        let entries = f.history.len();

        f.session
            .apply_event(AuthEvent::SignedIn(bob.clone()))
            .await;
        assert_eq!(*routes.borrow(), vec![Route::Clients]);
        assert_eq!(f.history.len(), entries);
        assert_eq!(f.history.current_page().as_deref(), Some("clients"));

        // Same user again: nothing changed, nothing re-rendered.
        f.session.apply_event(AuthEvent::TokenRefreshed(bob)).await;
        assert_eq!(routes.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_during_navigation_is_followed_after_it() {
        let f = fixture(None);
        f.router.init().await;
        sign_in(&f, "staff").await;
        let routes: Rc<RefCell<Vec<Route>>> = Rc::default();
        let (r, session) = (routes.clone(), f.session.clone());
        f.router.subscribe(move |route| {
            let (r, session) = (r.clone(), session.clone());
            async move {
                r.borrow_mut().push(route);
                if route == Route::Clients {
                    session.expire().await;
                }
                Ok::<(), ListenerError>(())
            }
        });

        let outcome = f.router.navigate(Route::Clients).await;
        assert_eq!(outcome, NavigationOutcome::Navigated(Route::Clients));
        assert_eq!(*routes.borrow(), vec![Route::Clients, Route::Login]);
        assert_eq!(f.router.current_route(), Route::Login);
        assert_eq!(f.history.current_page().as_deref(), Some("login"));
        assert!(!f.router.is_navigating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exclusive_work_is_refused_during_navigation() {
        let f = fixture(None);
        sign_in(&f, "coordinator").await;
        f.router.subscribe(|_| async {
            sleep(Duration::from_millis(50)).await;
            Ok::<(), ListenerError>(())
        });

        let during = async {
            sleep(Duration::from_millis(10)).await;
            f.router.exclusive(async { 1 }).await
        };
        let (navigated, refused) = futures::join!(f.router.navigate(Route::Clients), during);
        assert_eq!(navigated, NavigationOutcome::Navigated(Route::Clients));
        assert_eq!(refused, None);

        assert_eq!(f.router.exclusive(async { 2 }).await, Some(2));
        assert!(!f.router.is_navigating());
    }
}
