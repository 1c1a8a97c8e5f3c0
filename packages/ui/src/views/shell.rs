use dioxus::prelude::*;
use std::rc::Rc;
use store::{PreferenceStore, Preferences, Theme};

use super::content_view::PageContentView;
use super::overlay::ModalOverlay;
use crate::content::PageContent;
use crate::screen::LayoutModel;
use crate::services::AppCommand;

/// Context handle to the browser preference storage.
#[derive(Clone)]
pub struct PreferencesHandle(pub Rc<dyn PreferenceStore>);

impl PreferencesHandle {
    pub fn load(&self) -> Preferences {
        Preferences::load(self.0.as_ref())
    }

    pub fn save(&self, preferences: &Preferences) {
        preferences.save(self.0.as_ref());
    }
}

/// The shared layout: sidebar navigation around the page content.
#[component]
pub fn AppShell(layout: LayoutModel, content: PageContent) -> Element {
    let commands = use_coroutine_handle::<AppCommand>();
    let storage = use_context::<PreferencesHandle>();
    let mut preferences = use_signal(|| storage.load());
    let mut confirm_logout = use_signal(|| false);

    let prefs = preferences();
    let shell_class = match prefs.theme {
        Theme::Light => "shell theme-light",
        Theme::Dark => "shell theme-dark",
    };

    let toggle_sidebar = {
        let storage = storage.clone();
        move |_: MouseEvent| {
            preferences.write().sidebar_collapsed ^= true;
            storage.save(&preferences());
        }
    };
    let toggle_theme = move |_: MouseEvent| {
        let next = match preferences().theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        preferences.write().theme = next;
        storage.save(&preferences());
    };

    rsx! {
        div {
            class: shell_class,
            aside {
                class: if prefs.sidebar_collapsed { "sidebar collapsed" } else { "sidebar" },
                div {
                    class: "sidebar-user",
                    span { class: "sidebar-user-name", "{layout.user_name}" }
                    span { class: "role-badge", "{layout.role_label}" }
                }
                nav {
                    class: "sidebar-nav",
                    for entry in layout.nav.iter() {
                        button {
                            key: "{entry.route}",
                            class: if entry.route == layout.active { "nav-item active" } else { "nav-item" },
                            onclick: {
                                let route = entry.route;
                                move |_| commands.send(AppCommand::Navigate(route))
                            },
                            "{entry.label}"
                        }
                    }
                }
                div {
                    class: "sidebar-bottom",
                    button {
                        class: "sidebar-bottom-item",
                        title: "Collapse sidebar",
                        onclick: toggle_sidebar,
                        if prefs.sidebar_collapsed { "\u{00BB}" } else { "\u{00AB}" }
                    }
                    button {
                        class: "sidebar-bottom-item",
                        onclick: toggle_theme,
                        "Theme"
                    }
                    button {
                        class: "sidebar-bottom-item",
                        onclick: move |_| confirm_logout.set(true),
                        "Sign out"
                    }
                }
            }
            main {
                class: "content",
                PageContentView { content }
            }
            if confirm_logout() {
                ModalOverlay {
                    on_close: move |_| confirm_logout.set(false),
                    div {
                        class: "confirm",
                        p { "Sign out of the clinic?" }
                        button {
                            class: "button",
                            onclick: move |_| confirm_logout.set(false),
                            "Cancel"
                        }
                        button {
                            class: "button primary",
                            onclick: move |_| {
                                confirm_logout.set(false);
                                commands.send(AppCommand::Logout);
                            },
                            "Sign out"
                        }
                    }
                }
            }
        }
    }
}
