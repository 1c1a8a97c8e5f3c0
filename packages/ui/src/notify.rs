use crate::screen::Screen;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn css_class(self) -> &'static str {
        match self {
            ToastLevel::Info => "toast info",
            ToastLevel::Success => "toast success",
            ToastLevel::Warning => "toast warning",
            ToastLevel::Error => "toast error",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
}

/// Transient feedback: toasts and the global overlays.
pub trait Notifier {
    fn toast(&self, level: ToastLevel, message: &str);
    fn show_loading(&self);
    fn hide_loading(&self);
    /// Full-screen overlay whose only way out is a manual reload.
    fn show_blocking_error(&self, message: &str);
}

/// Whatever is on screen below the overlays.
pub trait Surface {
    fn show(&self, screen: Screen);
}
