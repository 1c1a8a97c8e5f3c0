//! Read-only list pages over the clinic's tables.
//!
//! Each record type says how it is queried, which cache TTL bucket it falls
//! in, and how a row becomes table cells. [`RecordListPage`] does the rest.

use api::{
    Anamnesis, Appointment, Backend, Client, Collaborator, InventoryItem, Order, Prontuario,
    Query, Record, SupervisionSession, TestCatalogEntry, Transaction, TransactionKind,
};
use futures::future::LocalBoxFuture;
use serde::Serialize;
use std::marker::PhantomData;

use super::format;
use crate::content::{PageBody, PageContent, Table};
use crate::error::PageError;
use crate::page::{Page, PageContext};

pub trait Listing: Record + Serialize + 'static {
    /// Cache TTL bucket.
    const DATA_TYPE: &'static str;
    const TITLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn query() -> Query;
    fn cells(&self) -> Vec<String>;
}

pub struct RecordListPage<R> {
    _record: PhantomData<R>,
}

impl<R> Default for RecordListPage<R> {
    fn default() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R: Listing> RecordListPage<R> {
    async fn load<B: Backend>(ctx: &PageContext<B>) -> Result<Table, PageError> {
        let fetched = ctx.cached_select(R::DATA_TYPE, &R::query()).await?;
        let rows = fetched
            .data
            .into_iter()
            .map(|row| serde_json::from_value::<R>(row).map(|r| r.cells()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table {
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
            stale: fetched.expired,
        })
    }
}

impl<B: Backend, R: Listing> Page<B> for RecordListPage<R> {
    fn render<'a>(
        &'a mut self,
        ctx: &'a PageContext<B>,
    ) -> LocalBoxFuture<'a, Result<PageContent, PageError>> {
        Box::pin(async move {
            let table = Self::load(ctx).await?;
            tracing::debug!(table = R::TABLE, rows = table.rows.len(), "list loaded");
            Ok(PageContent::new(R::TITLE, PageBody::Table(table)))
        })
    }

    fn prefetch<'a>(&'a self, ctx: &'a PageContext<B>) -> LocalBoxFuture<'a, Result<(), PageError>> {
        Box::pin(async move {
            ctx.cached_select(R::DATA_TYPE, &R::query()).await?;
            Ok(())
        })
    }
}

impl Listing for Client {
    const DATA_TYPE: &'static str = "clients";
    const TITLE: &'static str = "Clients";
    const COLUMNS: &'static [&'static str] = &["Name", "Email", "Phone", "Birth date", "Status"];

    fn query() -> Query {
        Query::table(Self::TABLE).order("name", Order::Asc)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format::optional(self.email.as_deref()),
            format::optional(self.phone.as_deref()),
            self.birth_date.map(format::date).unwrap_or_else(|| "-".into()),
            format::active(self.active),
        ]
    }
}

impl Listing for Appointment {
    const DATA_TYPE: &'static str = "appointments";
    const TITLE: &'static str = "Appointments";
    const COLUMNS: &'static [&'static str] = &["When", "Client", "Status", "Notes"];

    fn query() -> Query {
        Query::table(Self::TABLE)
            .select("*, clients(name)")
            .order("scheduled_at", Order::Asc)
            .limit(100)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format::date_time(self.scheduled_at),
            format::optional(self.client.as_ref().map(|c| c.name.as_str())),
            format::optional(self.status.as_deref()),
            format::optional(self.notes.as_deref()),
        ]
    }
}

impl Listing for Transaction {
    const DATA_TYPE: &'static str = "financial";
    const TITLE: &'static str = "Financial";
    const COLUMNS: &'static [&'static str] = &["Date", "Description", "Type", "Amount"];

    fn query() -> Query {
        Query::table(Self::TABLE)
            .order("occurred_on", Order::Desc)
            .limit(200)
    }

    fn cells(&self) -> Vec<String> {
        let kind = match self.kind {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        };
        vec![
            format::date(self.occurred_on),
            self.description.clone(),
            kind.to_string(),
            format::money(self.amount_cents),
        ]
    }
}

impl Listing for InventoryItem {
    const DATA_TYPE: &'static str = "inventory";
    const TITLE: &'static str = "Inventory";
    const COLUMNS: &'static [&'static str] = &["Item", "Category", "Quantity", "Minimum", "Stock"];

    fn query() -> Query {
        Query::table(Self::TABLE).order("name", Order::Asc)
    }

    fn cells(&self) -> Vec<String> {
        let stock = if self.is_low_stock() { "Low" } else { "OK" };
        vec![
            self.name.clone(),
            format::optional(self.category.as_deref()),
            self.quantity.to_string(),
            self.minimum_quantity.to_string(),
            stock.to_string(),
        ]
    }
}

impl Listing for Collaborator {
    const DATA_TYPE: &'static str = "collaborators";
    const TITLE: &'static str = "Collaborators";
    const COLUMNS: &'static [&'static str] = &["Name", "Email", "Role", "Status"];

    fn query() -> Query {
        Query::table(Self::TABLE).order("name", Order::Asc)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.role.clone(),
            format::active(self.active),
        ]
    }
}

impl Listing for Prontuario {
    const DATA_TYPE: &'static str = "prontuarios";
    const TITLE: &'static str = "Prontuários";
    const COLUMNS: &'static [&'static str] = &["Client", "Opened", "Summary"];

    fn query() -> Query {
        Query::table(Self::TABLE)
            .select("*, clients(name)")
            .order("opened_on", Order::Desc)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format::optional(self.client.as_ref().map(|c| c.name.as_str())),
            format::date(self.opened_on),
            format::optional(self.summary.as_deref()),
        ]
    }
}

impl Listing for Anamnesis {
    const DATA_TYPE: &'static str = "anamnesis";
    const TITLE: &'static str = "Anamnesis";
    const COLUMNS: &'static [&'static str] = &["Client", "Recorded", "Main complaint"];

    fn query() -> Query {
        Query::table(Self::TABLE)
            .select("*, clients(name)")
            .order("recorded_on", Order::Desc)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format::optional(self.client.as_ref().map(|c| c.name.as_str())),
            format::date(self.recorded_on),
            format::optional(self.complaint.as_deref()),
        ]
    }
}

impl Listing for TestCatalogEntry {
    const DATA_TYPE: &'static str = "test_catalog";
    const TITLE: &'static str = "Test catalog";
    const COLUMNS: &'static [&'static str] = &["Test", "Acronym", "Domain", "Ages"];

    fn query() -> Query {
        Query::table(Self::TABLE).order("name", Order::Asc)
    }

    fn cells(&self) -> Vec<String> {
        let ages = match (self.min_age, self.max_age) {
            (Some(min), Some(max)) => format!("{min}-{max}"),
            (Some(min), None) => format!("{min}+"),
            (None, Some(max)) => format!("up to {max}"),
            (None, None) => "-".to_string(),
        };
        vec![
            self.name.clone(),
            format::optional(self.acronym.as_deref()),
            format::optional(self.domain.as_deref()),
            ages,
        ]
    }
}

impl Listing for SupervisionSession {
    const DATA_TYPE: &'static str = "supervision";
    const TITLE: &'static str = "Supervision";
    const COLUMNS: &'static [&'static str] = &["Date", "Topic", "Hours"];

    fn query() -> Query {
        Query::table(Self::TABLE).order("held_on", Order::Desc)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format::date(self.held_on),
            format::optional(self.topic.as_deref()),
            format!("{:.1}", self.hours),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;
    use crate::session::AuthSession;
    use api::MemoryBackend;
    use std::rc::Rc;
    use store::{CacheConfig, LocalCache};
    use tokio_util::sync::CancellationToken;

    fn context(backend: &MemoryBackend) -> PageContext<MemoryBackend> {
        let backend = Rc::new(backend.clone());
        PageContext {
            session: Rc::new(AuthSession::new(backend.clone(), Vec::new())),
            backend,
            cache: Rc::new(LocalCache::new(CacheConfig::default())),
            route: Route::Appointments,
            cancel: CancellationToken::new(),
            force_refresh: false,
        }
    }

    #[tokio::test]
    async fn test_appointments_render_joined_client_name() {
        let backend = MemoryBackend::new();
        backend.insert_rows(
            "appointments",
            vec![serde_json::json!({
                "id": "a1",
                "client_id": "c1",
                "scheduled_at": "2026-03-02T13:00:00Z",
                "status": "confirmed",
                "clients": { "name": "<b>Maria</b>" }
            })],
        );
        let ctx = context(&backend);
        let mut page = RecordListPage::<Appointment>::default();

        let content = page.render(&ctx).await.unwrap();
        let PageBody::Table(table) = content.body else {
            panic!("expected a table");
        };
        assert_eq!(table.columns.len(), 4);
        assert_eq!(
            table.rows,
            vec![vec![
                "02/03/2026 13:00".to_string(),
                "<b>Maria</b>".to_string(),
                "confirmed".to_string(),
                "-".to_string(),
            ]]
        );
        assert!(!table.stale);
    }

    #[tokio::test]
    async fn test_malformed_row_is_decode_error() {
        let backend = MemoryBackend::new();
        backend.insert_rows("clients", vec![serde_json::json!({ "id": 7 })]);
        let ctx = context(&backend);
        let mut page = RecordListPage::<Client>::default();
        assert!(matches!(page.render(&ctx).await, Err(PageError::Decode(_))));
    }

    #[tokio::test]
    async fn test_prefetch_warms_cache_for_render() {
        let backend = MemoryBackend::new();
        backend.insert_rows(
            "inventory_items",
            vec![serde_json::json!({ "id": "i1", "name": "Gloves", "quantity": 2, "minimum_quantity": 5 })],
        );
        let ctx = context(&backend);
        let mut page = RecordListPage::<InventoryItem>::default();

        Page::<MemoryBackend>::prefetch(&page, &ctx).await.unwrap();
        let content = page.render(&ctx).await.unwrap();
        assert_eq!(backend.select_count("inventory_items"), 1);
        let PageBody::Table(table) = content.body else {
            panic!("expected a table");
        };
        assert_eq!(table.rows[0][4], "Low");
    }
}
