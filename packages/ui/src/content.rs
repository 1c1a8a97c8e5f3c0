//! Renderer-independent page output.
//!
//! Pages never build markup. They return a [`PageContent`] and the Dioxus
//! layer turns it into elements, escaping every interpolated string.

#[derive(Clone, Debug, PartialEq)]
pub struct PageContent {
    pub title: String,
    pub body: PageBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PageBody {
    LoginForm,
    Stats(Vec<Stat>),
    Table(Table),
    Message(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stat {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Set when the rows came from an expired cache entry.
    pub stale: bool,
}

impl PageContent {
    pub fn new(title: impl Into<String>, body: PageBody) -> Self {
        Self {
            title: title.into(),
            body,
        }
    }

    pub fn message(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, PageBody::Message(message.into()))
    }
}

impl Stat {
    pub fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}
