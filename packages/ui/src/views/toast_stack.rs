use dioxus::prelude::*;
use std::time::Duration;

use super::surface::use_surface;
use crate::notify::Toast;
use crate::timer::sleep;

const TOAST_LIFETIME: Duration = Duration::from_secs(5);

#[component]
pub fn ToastStack() -> Element {
    let surface = use_surface();
    let toasts = (surface.toasts)();

    rsx! {
        div {
            class: "toast-stack",
            for toast in toasts {
                ToastItem { key: "{toast.id}", toast: toast.clone() }
            }
        }
    }
}

#[component]
fn ToastItem(toast: Toast) -> Element {
    let surface = use_surface();
    let id = toast.id;

    use_future(move || async move {
        sleep(TOAST_LIFETIME).await;
        surface.dismiss(id);
    });

    rsx! {
        div {
            class: toast.level.css_class(),
            role: "status",
            span { class: "toast-message", "{toast.message}" }
            button {
                class: "toast-close",
                title: "Dismiss",
                onclick: move |_| surface.dismiss(id),
                "\u{00D7}"
            }
        }
    }
}
