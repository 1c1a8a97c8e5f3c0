use dioxus::prelude::*;
use std::time::Duration;

use crate::route::Route;
use crate::screen::ErrorScreen;
use crate::services::AppCommand;
use crate::timer::sleep;

/// Full-page failure with retry and reload, and an optional countdown back to login.
#[component]
pub fn ErrorView(error: ErrorScreen) -> Element {
    let commands = use_coroutine_handle::<AppCommand>();
    let mut remaining = use_signal(|| {
        error
            .redirect_to_login_after
            .map(|d| d.as_millis().div_ceil(1000) as u64)
    });

    use_future(move || async move {
        while let Some(left) = remaining() {
            if left == 0 {
                commands.send(AppCommand::Navigate(Route::Login));
                remaining.set(None);
                break;
            }
            sleep(Duration::from_secs(1)).await;
            // Retry may have cancelled the countdown while we slept.
            if remaining().is_some() {
                remaining.set(Some(left - 1));
            }
        }
    });

    let retry = error.retry_route;

    rsx! {
        div {
            class: "error-view",
            h1 { "{error.title}" }
            p { class: "error-message", "{error.message}" }
            div {
                class: "error-actions",
                if let Some(route) = retry {
                    button {
                        class: "button primary",
                        onclick: move |_| {
                            remaining.set(None);
                            commands.send(AppCommand::Retry(route));
                        },
                        "Try again"
                    }
                }
                button {
                    class: "button",
                    onclick: move |_| commands.send(AppCommand::Reload),
                    "Reload"
                }
            }
            if let Some(left) = remaining() {
                p { class: "error-redirect", "Returning to sign-in in {left}s" }
            }
        }
    }
}
