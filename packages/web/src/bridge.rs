//! Window events the app reacts to, forwarded from JS through `document::eval`.

use dioxus::prelude::*;
use serde::Deserialize;
use ui::{AppCommand, ClinicHandle, Notifier, ToastLevel};

const LISTENERS_JS: &str = r#"(function() {
    window.addEventListener('popstate', function() {
        dioxus.send({ kind: 'popstate' });
    });
    window.addEventListener('error', function(e) {
        dioxus.send({ kind: 'error', message: String(e.message || 'Script error') });
    });
    window.addEventListener('unhandledrejection', function(e) {
        var reason = e.reason && e.reason.message ? e.reason.message : String(e.reason);
        dioxus.send({ kind: 'rejection', message: reason });
    });
})();"#;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum BrowserEvent {
    Popstate,
    Error { message: String },
    Rejection { message: String },
}

/// Route back/forward into the router and surface uncaught script failures.
pub fn use_browser_events(handle: ClinicHandle) {
    use_future(move || async move {
        let mut eval = document::eval(LISTENERS_JS);
        while let Ok(event) = eval.recv::<BrowserEvent>().await {
            match event {
                BrowserEvent::Popstate => handle.commands.send(AppCommand::HistoryChanged),
                BrowserEvent::Error { message } => {
                    tracing::error!(%message, "uncaught error");
                    handle
                        .surface
                        .toast(ToastLevel::Error, &format!("Unexpected error: {message}"));
                }
                BrowserEvent::Rejection { message } => {
                    tracing::error!(%message, "unhandled promise rejection");
                    handle
                        .surface
                        .toast(ToastLevel::Error, &format!("Unexpected error: {message}"));
                }
            }
        }
        tracing::debug!("browser event bridge closed");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_bridge_messages() {
        let popstate: BrowserEvent = serde_json::from_str(r#"{"kind":"popstate"}"#).unwrap();
        assert_eq!(popstate, BrowserEvent::Popstate);

        let error: BrowserEvent =
            serde_json::from_str(r#"{"kind":"rejection","message":"boom"}"#).unwrap();
        assert_eq!(
            error,
            BrowserEvent::Rejection {
                message: "boom".into()
            }
        );
    }
}
