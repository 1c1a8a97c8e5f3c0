use api::{BackendConfig, RestBackend};
use dioxus::prelude::*;
use std::rc::Rc;
use store::PreferenceStore;
use ui::{use_clinic, AppConfig, ClinicApp, History, Services};

mod bridge;

const MAIN_CSS: Asset = asset!("/assets/main.css");
const APP_CONFIG: &str = include_str!("../clinic.toml");

fn main() {
    if let Err(e) = dioxus::logger::init(tracing::Level::INFO) {
        eprintln!("logger already initialized: {e}");
    }
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let backend = use_hook(|| BackendConfig::from_env().map_err(|e| e.to_string()));

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        {
            match backend {
                Ok(config) => rsx! { Clinic { config } },
                Err(message) => rsx! {
                    div {
                        class: "error-view",
                        h1 { "The clinic app is not configured" }
                        p { class: "error-message", "{message}" }
                    }
                },
            }
        }
    }
}

#[component]
fn Clinic(config: BackendConfig) -> Element {
    let preferences = use_hook(preference_store);
    let tokens = preferences.clone();
    let handle = use_clinic(preferences, move |surface, notifier| {
        let emails = config.coordinator_emails.clone();
        Services::new(
            RestBackend::new(config).with_token_store(tokens),
            emails,
            history(),
            surface,
            notifier,
            app_config(),
        )
    });
    bridge::use_browser_events(handle);

    rsx! { ClinicApp {} }
}

fn app_config() -> AppConfig {
    AppConfig::from_toml(APP_CONFIG).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid clinic.toml, using defaults");
        AppConfig::default()
    })
}

#[cfg(target_arch = "wasm32")]
fn history() -> Rc<dyn History> {
    Rc::new(ui::BrowserHistory)
}

#[cfg(not(target_arch = "wasm32"))]
fn history() -> Rc<dyn History> {
    Rc::new(ui::MemoryHistory::new(None))
}

#[cfg(target_arch = "wasm32")]
fn preference_store() -> Rc<dyn PreferenceStore> {
    Rc::new(store::LocalStoragePreferences::new())
}

#[cfg(not(target_arch = "wasm32"))]
fn preference_store() -> Rc<dyn PreferenceStore> {
    Rc::new(store::MemoryPreferences::new())
}
