use dioxus::prelude::*;
use futures::channel::oneshot;

use crate::services::AppCommand;

#[component]
pub fn LoginForm() -> Element {
    let commands = use_coroutine_handle::<AppCommand>();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut submitting = use_signal(|| false);

    let onsubmit = move |evt: FormEvent| {
        evt.prevent_default();
        if submitting() {
            return;
        }
        submitting.set(true);
        error.set(None);
        let (reply, outcome) = oneshot::channel();
        commands.send(AppCommand::Login {
            email: email(),
            password: password(),
            reply: Some(reply),
        });
        spawn(async move {
            match outcome.await {
                Ok(Ok(())) => password.set(String::new()),
                Ok(Err(message)) => error.set(Some(message)),
                Err(_) => error.set(Some("Sign-in was interrupted".to_string())),
            }
            submitting.set(false);
        });
    };

    rsx! {
        form {
            class: "login-form",
            onsubmit: onsubmit,
            label {
                "Email"
                input {
                    r#type: "email",
                    autocomplete: "username",
                    value: "{email}",
                    oninput: move |evt| email.set(evt.value()),
                }
            }
            label {
                "Password"
                input {
                    r#type: "password",
                    autocomplete: "current-password",
                    value: "{password}",
                    oninput: move |evt| password.set(evt.value()),
                }
            }
            if let Some(message) = error() {
                p { class: "login-error", "{message}" }
            }
            button {
                class: "button primary",
                r#type: "submit",
                disabled: submitting(),
                if submitting() {
                    "Signing in..."
                } else {
                    "Sign in"
                }
            }
        }
    }
}
