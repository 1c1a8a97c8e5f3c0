//! PostgREST-style query builder.
//!
//! ```
//! use api::{Order, Query};
//!
//! let q = Query::table("appointments")
//!     .select("*, clients(name)")
//!     .eq("status", "confirmed")
//!     .order("scheduled_at", Order::Asc)
//!     .limit(50);
//! assert_eq!(
//!     q.to_query_string(),
//!     "select=*,clients(name)&status=eq.confirmed&order=scheduled_at.asc&limit=50"
//! );
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    table: String,
    select: String,
    filters: Vec<(String, String)>,
    order: Vec<(String, Order)>,
    limit: Option<usize>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Columns to return; embedded joins use `relation(cols)` syntax.
    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.chars().filter(|c| !c.is_whitespace()).collect();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("gte.{}", value.to_string())));
        self
    }

    pub fn lt(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("lt.{}", value.to_string())));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order.push((column.to_string(), order));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Equality filters as `(column, value)` pairs, for in-memory evaluation.
    pub fn eq_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter_map(|(col, f)| f.strip_prefix("eq.").map(|v| (col.as_str(), v)))
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// Query parameters as `(name, value)` pairs, unencoded.
    ///
    /// Values may hold `&`, `=` or spaces; the HTTP layer encodes them.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(col, o)| format!("{col}.{}", o.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Readable `name=value&...` form of [`Query::params`].
    ///
    /// Not URL-encoded; used as a cache key and in logs, never as a URL.
    pub fn to_query_string(&self) -> String {
        self.params()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}
