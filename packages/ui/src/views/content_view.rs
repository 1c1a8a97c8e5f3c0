use dioxus::prelude::*;

use super::login_form::LoginForm;
use crate::content::{PageBody, PageContent, Stat, Table};

#[component]
pub fn PageContentView(content: PageContent) -> Element {
    rsx! {
        section {
            class: "page",
            h1 { class: "page-title", "{content.title}" }
            {
                match content.body {
                    PageBody::LoginForm => rsx! { LoginForm {} },
                    PageBody::Stats(stats) => rsx! { StatGrid { stats } },
                    PageBody::Table(table) => rsx! { DataTable { table } },
                    PageBody::Message(message) => rsx! { p { class: "page-message", "{message}" } },
                }
            }
        }
    }
}

#[component]
fn StatGrid(stats: Vec<Stat>) -> Element {
    rsx! {
        div {
            class: "stat-grid",
            for stat in stats {
                div {
                    class: "stat-card",
                    span { class: "stat-value", "{stat.value}" }
                    span { class: "stat-label", "{stat.label}" }
                }
            }
        }
    }
}

#[component]
fn DataTable(table: Table) -> Element {
    if table.rows.is_empty() {
        return rsx! { p { class: "page-message", "No records yet." } };
    }

    rsx! {
        if table.stale {
            p { class: "stale-notice", "Showing saved data; the server could not be reached." }
        }
        table {
            class: "data-table",
            thead {
                tr {
                    for column in table.columns.iter() {
                        th { "{column}" }
                    }
                }
            }
            tbody {
                for row in table.rows.iter() {
                    tr {
                        for cell in row.iter() {
                            td { "{cell}" }
                        }
                    }
                }
            }
        }
    }
}
