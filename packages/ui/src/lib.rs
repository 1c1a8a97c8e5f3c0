//! Client core and shared views for the clinic admin app.
//!
//! The core (session, router, controller, pages) is plain async Rust over
//! `Rc`/`RefCell` and runs under tokio in tests. Only [`views`] depends on
//! Dioxus.

pub mod app;
pub mod config;
pub mod content;
pub mod error;
pub mod history;
pub mod notify;
pub mod page;
pub mod pages;
pub mod permissions;
pub mod prefetch;
pub mod route;
pub mod router;
pub mod screen;
pub mod services;
pub mod session;
pub mod timer;
pub mod views;

#[cfg(test)]
mod testing;

pub use app::{AppController, RenderOutcome};
pub use config::AppConfig;
pub use content::{PageBody, PageContent, Stat, Table};
pub use error::{AuthError, ListenerError, PageError, RegistryError};
pub use history::{History, HistoryMode, MemoryHistory};
#[cfg(target_arch = "wasm32")]
pub use history::BrowserHistory;
pub use notify::{Notifier, Surface, Toast, ToastLevel};
pub use page::{Page, PageContext, PageFactory, PageRegistry};
pub use permissions::Role;
pub use route::{Access, Route};
pub use router::{NavigationOutcome, Router};
pub use screen::{ErrorScreen, LayoutModel, NavEntry, Screen};
pub use services::{AppCommand, Services};
pub use session::{AuthChange, AuthSession, Profile, SessionUser};
pub use views::{use_clinic, ClinicApp, ClinicHandle};
