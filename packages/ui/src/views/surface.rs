use dioxus::prelude::*;

use crate::notify::{Notifier, Surface, Toast, ToastLevel};
use crate::screen::Screen;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayState {
    pub loading: bool,
    pub blocking_error: Option<String>,
}

/// [`Surface`] and [`Notifier`] backed by signals the root component owns.
#[derive(Clone, Copy)]
pub struct SignalSurface {
    pub screen: Signal<Screen>,
    pub overlay: Signal<OverlayState>,
    pub toasts: Signal<Vec<Toast>>,
    next_toast: Signal<u64>,
}

impl SignalSurface {
    /// Must be called from a component body: the signals belong to its scope.
    pub fn use_new() -> Self {
        Self {
            screen: use_signal(Screen::default),
            overlay: use_signal(OverlayState::default),
            toasts: use_signal(Vec::new),
            next_toast: use_signal(|| 0),
        }
    }

    pub fn dismiss(&self, id: u64) {
        let mut toasts = self.toasts;
        toasts.write().retain(|t| t.id != id);
    }
}

pub fn use_surface() -> SignalSurface {
    use_context::<SignalSurface>()
}

impl Surface for SignalSurface {
    fn show(&self, screen: Screen) {
        let mut signal = self.screen;
        signal.set(screen);
    }
}

impl Notifier for SignalSurface {
    fn toast(&self, level: ToastLevel, message: &str) {
        let mut next = self.next_toast;
        let id = next();
        next.set(id + 1);
        let mut toasts = self.toasts;
        toasts.write().push(Toast {
            id,
            level,
            message: message.to_string(),
        });
    }

    fn show_loading(&self) {
        let mut overlay = self.overlay;
        overlay.write().loading = true;
    }

    fn hide_loading(&self) {
        let mut overlay = self.overlay;
        overlay.write().loading = false;
    }

    fn show_blocking_error(&self, message: &str) {
        let mut overlay = self.overlay;
        overlay.write().blocking_error = Some(message.to_string());
    }
}
