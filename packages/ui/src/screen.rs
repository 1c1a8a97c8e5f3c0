use std::time::Duration;

use crate::content::PageContent;
use crate::route::Route;

#[derive(Clone, Debug, PartialEq)]
pub struct NavEntry {
    pub route: Route,
    pub label: &'static str,
}

/// The shared layout around every signed-in page.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutModel {
    pub user_name: String,
    pub role_label: String,
    pub nav: Vec<NavEntry>,
    pub active: Route,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ErrorScreen {
    pub title: String,
    pub message: String,
    pub retry_route: Option<Route>,
    /// Countdown after which the view sends the user to login.
    pub redirect_to_login_after: Option<Duration>,
    /// Render that failed. A repeat failure gets a fresh view and countdown.
    pub seq: u64,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Screen {
    #[default]
    Blank,
    Standalone(PageContent),
    Shell {
        layout: LayoutModel,
        content: PageContent,
    },
    Error(ErrorScreen),
}

impl Screen {
    pub fn title(&self) -> Option<&str> {
        match self {
            Screen::Blank => None,
            Screen::Standalone(content) | Screen::Shell { content, .. } => Some(&content.title),
            Screen::Error(error) => Some(&error.title),
        }
    }
}
