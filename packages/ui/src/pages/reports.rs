use api::{Backend, Order, Query, Record, Transaction, TransactionKind};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};
use futures::future::LocalBoxFuture;

use super::format;
use crate::content::{PageBody, PageContent, Stat};
use crate::error::PageError;
use crate::page::{Page, PageContext};

/// Monthly income/expense summary.
#[derive(Debug, Default)]
pub struct ReportsPage;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonthSummary {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub transactions: usize,
}

impl MonthSummary {
    pub fn from_transactions<'a>(items: impl IntoIterator<Item = &'a Transaction>) -> Self {
        items.into_iter().fold(Self::default(), |mut acc, t| {
            match t.kind {
                TransactionKind::Income => acc.income_cents += t.amount_cents,
                TransactionKind::Expense => acc.expense_cents += t.amount_cents,
            }
            acc.transactions += 1;
            acc
        })
    }

    pub fn balance_cents(&self) -> i64 {
        self.income_cents - self.expense_cents
    }
}

/// First day of `day`'s month and of the month after.
fn month_bounds(day: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = day.with_day(1)?;
    let next = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)?
    };
    Some((start, next))
}

/// The month `now` falls in, by the clinic's wall clock.
fn month_of<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<(NaiveDate, NaiveDate)> {
    month_bounds(now.date_naive())
}

fn month_query(start: NaiveDate, next: NaiveDate) -> Query {
    Query::table(Transaction::TABLE)
        .gte("occurred_on", start)
        .lt("occurred_on", next)
        .order("occurred_on", Order::Asc)
}

impl ReportsPage {
    async fn summary<B: Backend>(ctx: &PageContext<B>) -> Result<(NaiveDate, MonthSummary), PageError> {
        let now = Local::now();
        let (start, next) =
            month_of(&now).ok_or_else(|| PageError::Other(format!("no month for {now}")))?;
        let fetched = ctx.cached_select("reports", &month_query(start, next)).await?;
        let items = fetched
            .data
            .into_iter()
            .map(serde_json::from_value::<Transaction>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((start, MonthSummary::from_transactions(&items)))
    }
}

impl<B: Backend> Page<B> for ReportsPage {
    fn render<'a>(
        &'a mut self,
        ctx: &'a PageContext<B>,
    ) -> LocalBoxFuture<'a, Result<PageContent, PageError>> {
        Box::pin(async move {
            let (month, summary) = Self::summary(ctx).await?;
            let stats = vec![
                Stat::new("Month", month.format("%m/%Y")),
                Stat::new("Income", format::money(summary.income_cents)),
                Stat::new("Expenses", format::money(summary.expense_cents)),
                Stat::new("Balance", format::money(summary.balance_cents())),
                Stat::new("Transactions", summary.transactions),
            ];
            Ok(PageContent::new("Reports", PageBody::Stats(stats)))
        })
    }

    fn prefetch<'a>(&'a self, ctx: &'a PageContext<B>) -> LocalBoxFuture<'a, Result<(), PageError>> {
        Box::pin(async move {
            Self::summary(ctx).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds_wrap_year() {
        let dec = NaiveDate::from_ymd_opt(2026, 12, 17).unwrap();
        assert_eq!(
            month_bounds(dec),
            Some((
                NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
            ))
        );
    }

    #[test]
    fn test_month_follows_local_date() {
        // Still March 31st in UTC-3 while UTC has moved to April.
        let zone = chrono::FixedOffset::west_opt(3 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2026, 3, 31, 22, 30, 0).unwrap();
        assert_eq!(
            month_of(&now),
            Some((
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
            ))
        );
    }

    #[test]
    fn test_summary_totals() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let t = |kind, amount_cents| Transaction {
            id: "t".into(),
            kind,
            amount_cents,
            description: "x".into(),
            occurred_on: day,
            client_id: None,
        };
        let items = [
            t(TransactionKind::Income, 50_000),
            t(TransactionKind::Income, 25_000),
            t(TransactionKind::Expense, 10_000),
        ];
        let summary = MonthSummary::from_transactions(&items);
        assert_eq!(summary.balance_cents(), 65_000);
        assert_eq!(summary.transactions, 3);
    }

    #[test]
    fn test_month_query_filters_range() {
        let (start, next) = month_bounds(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()).unwrap();
        assert_eq!(
            month_query(start, next).to_query_string(),
            "select=*&occurred_on=gte.2026-03-01&occurred_on=lt.2026-04-01&order=occurred_on.asc"
        );
    }
}
