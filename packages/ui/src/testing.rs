//! Recording collaborators for unit tests.

use std::cell::{Cell, RefCell};

use crate::notify::{Notifier, Surface, ToastLevel};
use crate::permissions::Role;
use crate::screen::Screen;
use crate::session::{Profile, SessionUser};

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub screens: RefCell<Vec<Screen>>,
    pub toasts: RefCell<Vec<(ToastLevel, String)>>,
    pub loading: Cell<bool>,
    pub loading_shown: Cell<usize>,
    pub blocking_error: RefCell<Option<String>>,
}

impl RecordingSurface {
    pub fn last_screen(&self) -> Option<Screen> {
        self.screens.borrow().last().cloned()
    }

    pub fn toast_messages(&self) -> Vec<String> {
        self.toasts.borrow().iter().map(|(_, m)| m.clone()).collect()
    }
}

impl Surface for RecordingSurface {
    fn show(&self, screen: Screen) {
        self.screens.borrow_mut().push(screen);
    }
}

impl Notifier for RecordingSurface {
    fn toast(&self, level: ToastLevel, message: &str) {
        self.toasts.borrow_mut().push((level, message.to_string()));
    }

    fn show_loading(&self) {
        self.loading.set(true);
        self.loading_shown.set(self.loading_shown.get() + 1);
    }

    fn hide_loading(&self) {
        self.loading.set(false);
    }

    fn show_blocking_error(&self, message: &str) {
        *self.blocking_error.borrow_mut() = Some(message.to_string());
    }
}

pub fn session_user(role: Role) -> SessionUser {
    SessionUser {
        id: "user-1".into(),
        email: "user@clinic.com".into(),
        profile: Profile {
            role,
            name: "Test User".into(),
            email: "user@clinic.com".into(),
        },
    }
}
