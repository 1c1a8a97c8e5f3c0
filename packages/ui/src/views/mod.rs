mod content_view;
pub use content_view::PageContentView;

mod error_view;
pub use error_view::ErrorView;

mod login_form;
pub use login_form::LoginForm;

mod overlay;
pub use overlay::{BlockingErrorOverlay, LoadingOverlay, ModalOverlay};

mod root;
pub use root::{use_clinic, ClinicApp, ClinicHandle};

mod shell;
pub use shell::{AppShell, PreferencesHandle};

mod surface;
pub use surface::{use_surface, OverlayState, SignalSurface};

mod toast_stack;
pub use toast_stack::ToastStack;
