//! URL synchronisation. The active route lives in the `page` query parameter.

use std::cell::{Cell, RefCell};

use crate::route::Route;

pub const PAGE_PARAM: &str = "page";

/// How a navigation is recorded in the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    Replace,
}

pub trait History {
    fn current_query_param(&self, name: &str) -> Option<String>;
    fn push(&self, route: Route);
    fn replace(&self, route: Route);
    /// Full reload, the manual recovery from a stuck navigation.
    fn reload(&self);

    fn write(&self, route: Route, mode: HistoryMode) {
        match mode {
            HistoryMode::Push => self.push(route),
            HistoryMode::Replace => self.replace(route),
        }
    }
}

/// History stack held in memory, with back/forward like a browser tab.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: RefCell<Vec<Option<String>>>,
    cursor: Cell<usize>,
    reloads: Cell<usize>,
}

impl MemoryHistory {
    /// Start with `?page=<initial>` (or no parameter) in the address bar.
    pub fn new(initial: Option<&str>) -> Self {
        Self {
            entries: RefCell::new(vec![initial.map(str::to_string)]),
            cursor: Cell::new(0),
            reloads: Cell::new(0),
        }
    }

    pub fn back(&self) -> bool {
        let cursor = self.cursor.get();
        if cursor == 0 {
            return false;
        }
        self.cursor.set(cursor - 1);
        true
    }

    pub fn forward(&self) -> bool {
        let cursor = self.cursor.get();
        if cursor + 1 >= self.entries.borrow().len() {
            return false;
        }
        self.cursor.set(cursor + 1);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn current_page(&self) -> Option<String> {
        self.entries.borrow().get(self.cursor.get()).cloned().flatten()
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.get()
    }
}

impl History for MemoryHistory {
    fn current_query_param(&self, name: &str) -> Option<String> {
        if name == PAGE_PARAM {
            self.current_page()
        } else {
            None
        }
    }

    fn push(&self, route: Route) {
        let mut entries = self.entries.borrow_mut();
        let cursor = self.cursor.get();
        entries.truncate(cursor + 1);
        entries.push(Some(route.name().to_string()));
        self.cursor.set(entries.len() - 1);
    }

    fn replace(&self, route: Route) {
        let mut entries = self.entries.borrow_mut();
        let cursor = self.cursor.get();
        match entries.get_mut(cursor) {
            Some(entry) => *entry = Some(route.name().to_string()),
            None => entries.push(Some(route.name().to_string())),
        }
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}

/// `window.history` and `window.location`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHistory;

#[cfg(target_arch = "wasm32")]
impl BrowserHistory {
    fn url_for(route: Route) -> Option<String> {
        let location = web_sys::window()?.location();
        let params = web_sys::UrlSearchParams::new_with_str(&location.search().ok()?).ok()?;
        params.set(PAGE_PARAM, route.name());
        let path = location.pathname().ok()?;
        Some(format!("{path}?{}", String::from(params.to_string())))
    }

    fn update(route: Route, mode: HistoryMode) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(url) = Self::url_for(route) else {
            return;
        };
        let Ok(history) = window.history() else {
            return;
        };
        let state = wasm_bindgen::JsValue::NULL;
        let result = match mode {
            HistoryMode::Push => history.push_state_with_url(&state, "", Some(&url)),
            HistoryMode::Replace => history.replace_state_with_url(&state, "", Some(&url)),
        };
        if let Err(e) = result {
            tracing::warn!(?e, route = %route, "history update failed");
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl History for BrowserHistory {
    fn current_query_param(&self, name: &str) -> Option<String> {
        let search = web_sys::window()?.location().search().ok()?;
        web_sys::UrlSearchParams::new_with_str(&search)
            .ok()?
            .get(name)
    }

    fn push(&self, route: Route) {
        Self::update(route, HistoryMode::Push);
    }

    fn replace(&self, route: Route) {
        Self::update(route, HistoryMode::Replace);
    }

    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().reload() {
                tracing::error!(?e, "reload failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_truncates_forward_entries() {
        let history = MemoryHistory::new(None);
        history.push(Route::Dashboard);
        history.push(Route::Clients);
        assert!(history.back());
        history.push(Route::Reports);

        assert_eq!(history.len(), 3);
        assert!(!history.forward());
        assert_eq!(history.current_query_param(PAGE_PARAM).as_deref(), Some("reports"));
    }

    #[test]
    fn test_replace_keeps_length() {
        let history = MemoryHistory::new(Some("bogus"));
        history.write(Route::Login, HistoryMode::Replace);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_page().as_deref(), Some("login"));
    }

    #[test]
    fn test_other_params_are_absent() {
        let history = MemoryHistory::new(Some("clients"));
        assert_eq!(history.current_query_param("tab"), None);
    }
}
