use api::Backend;
use dioxus::prelude::*;
use futures::StreamExt;
use std::rc::Rc;
use store::PreferenceStore;

use super::content_view::PageContentView;
use super::error_view::ErrorView;
use super::overlay::{BlockingErrorOverlay, LoadingOverlay};
use super::shell::{AppShell, PreferencesHandle};
use super::surface::{use_surface, SignalSurface};
use super::toast_stack::ToastStack;
use crate::notify::{Notifier, Surface};
use crate::screen::Screen;
use crate::services::{AppCommand, Services};

/// What the host component gets back from [`use_clinic`].
#[derive(Clone, Copy)]
pub struct ClinicHandle {
    pub commands: Coroutine<AppCommand>,
    pub surface: SignalSurface,
}

/// Build the client services once and drive them for the lifetime of the
/// calling component. Render [`ClinicApp`] beneath it.
pub fn use_clinic<B, F>(preferences: Rc<dyn PreferenceStore>, build: F) -> ClinicHandle
where
    B: Backend + 'static,
    F: FnOnce(Rc<dyn Surface>, Rc<dyn Notifier>) -> Services<B>,
{
    let surface = SignalSurface::use_new();
    let services = use_hook(|| Rc::new(build(Rc::new(surface), Rc::new(surface))));
    use_context_provider(|| surface);
    use_context_provider(|| PreferencesHandle(preferences));

    let commands = use_coroutine({
        let services = services.clone();
        move |mut rx: UnboundedReceiver<AppCommand>| {
            let services = services.clone();
            async move {
                while let Some(command) = rx.next().await {
                    let services = services.clone();
                    // Commands overlap; the router and controller serialize what matters.
                    spawn(async move { services.handle(command).await });
                }
            }
        }
    });

    use_future({
        let services = services.clone();
        move || {
            let services = services.clone();
            async move {
                let outcome = services.start().await;
                tracing::debug!(?outcome, "first navigation settled");
            }
        }
    });
    use_future({
        let services = services.clone();
        move || {
            let services = services.clone();
            async move { services.pump_auth_events().await }
        }
    });
    use_future({
        let services = services.clone();
        move || {
            let services = services.clone();
            async move { services.run_cache_sweeper().await }
        }
    });

    use_drop(move || services.dispose());

    ClinicHandle { commands, surface }
}

/// Renders whatever the controller last put on the surface.
#[component]
pub fn ClinicApp() -> Element {
    let surface = use_surface();
    let screen = (surface.screen)();

    rsx! {
        {
            match screen {
                Screen::Blank => rsx! {
                    div { class: "boot", div { class: "spinner" } }
                },
                Screen::Standalone(content) => rsx! {
                    div { class: "standalone", PageContentView { content } }
                },
                Screen::Shell { layout, content } => rsx! {
                    AppShell { layout, content }
                },
                Screen::Error(error) => rsx! {
                    ErrorView { key: "{error.seq}", error }
                },
            }
        }
        ToastStack {}
        LoadingOverlay {}
        BlockingErrorOverlay {}
    }
}
