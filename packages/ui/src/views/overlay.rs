use dioxus::prelude::*;

use super::surface::use_surface;
use crate::services::AppCommand;

/// A full-screen overlay that centers its children in a modal card.
/// Clicking outside the card triggers `on_close`.
#[component]
pub fn ModalOverlay(on_close: EventHandler<()>, children: Element) -> Element {
    rsx! {
        div {
            class: "modal-backdrop",
            onclick: move |_| on_close.call(()),
            div {
                class: "modal-card",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                {children}
            }
        }
    }
}

#[component]
pub fn LoadingOverlay() -> Element {
    let surface = use_surface();
    if !(surface.overlay)().loading {
        return rsx! {};
    }

    rsx! {
        div {
            class: "loading-overlay",
            div { class: "spinner" }
        }
    }
}

/// Shown when navigation stalls. Reloading is the only way out.
#[component]
pub fn BlockingErrorOverlay() -> Element {
    let surface = use_surface();
    let commands = use_coroutine_handle::<AppCommand>();
    let Some(message) = (surface.overlay)().blocking_error else {
        return rsx! {};
    };

    rsx! {
        ModalOverlay {
            on_close: move |_| {},
            div {
                class: "blocking-error",
                h2 { "Something is stuck" }
                p { "{message}" }
                button {
                    class: "button primary",
                    onclick: move |_| commands.send(AppCommand::Reload),
                    "Reload"
                }
            }
        }
    }
}
