use api::{Appointment, Backend, Client, Query, Record};
use chrono::{DateTime, Days, Local, TimeZone};
use std::fmt::Display;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use store::CacheParams;

use super::format;
use crate::content::{PageBody, PageContent, Stat};
use crate::error::PageError;
use crate::page::{Page, PageContext};
use crate::permissions::{FINANCIAL, INVENTORY};

/// Aggregates from the `dashboard_stats` procedure.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub active_clients: u64,
    #[serde(default)]
    pub appointments_today: u64,
    #[serde(default)]
    pub monthly_income_cents: Option<i64>,
    #[serde(default)]
    pub low_stock_items: Option<u64>,
}

#[derive(Debug, Default)]
pub struct DashboardPage;

impl DashboardPage {
    async fn stats<B: Backend>(ctx: &PageContext<B>) -> Result<DashboardStats, PageError> {
        let fetched = ctx
            .cached("dashboard_stats", &CacheParams::new(), || async {
                let value = ctx.backend.rpc("dashboard_stats", serde_json::json!({})).await?;
                Ok::<_, PageError>(serde_json::from_value::<DashboardStats>(value)?)
            })
            .await;
        match fetched {
            Ok(fetched) => Ok(fetched.data),
            Err(e) if e.is_cancelled() || e.is_not_authenticated() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "dashboard_stats unavailable, counting rows");
                Self::counted(ctx).await
            }
        }
    }

    /// Row counts from the tables when the procedure is missing or failing.
    async fn counted<B: Backend>(ctx: &PageContext<B>) -> Result<DashboardStats, PageError> {
        let now = Local::now();
        let query = appointments_on(&now)
            .ok_or_else(|| PageError::Other(format!("no day bounds for {now}")))?;

        let clients = ctx
            .cached_select(
                "clients",
                &Query::table(Client::TABLE).select("id").eq("active", true),
            )
            .await?;
        let appointments = ctx
            .cached_select("appointments", &query)
            .await?;
        Ok(DashboardStats {
            active_clients: clients.data.len() as u64,
            appointments_today: appointments.data.len() as u64,
            ..DashboardStats::default()
        })
    }
}

/// Appointments scheduled between the local midnights around `now`.
fn appointments_on<Tz>(now: &DateTime<Tz>) -> Option<Query>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let zone = now.timezone();
    let today = now.date_naive();
    let start = zone.from_local_datetime(&today.and_hms_opt(0, 0, 0)?).earliest()?;
    let end = zone
        .from_local_datetime(&today.checked_add_days(Days::new(1))?.and_hms_opt(0, 0, 0)?)
        .earliest()?;
    Some(
        Query::table(Appointment::TABLE)
            .select("id")
            .gte("scheduled_at", start.to_rfc3339())
            .lt("scheduled_at", end.to_rfc3339()),
    )
}

impl<B: Backend> Page<B> for DashboardPage {
    fn render<'a>(
        &'a mut self,
        ctx: &'a PageContext<B>,
    ) -> LocalBoxFuture<'a, Result<PageContent, PageError>> {
        Box::pin(async move {
            let stats = Self::stats(ctx).await?;
            let mut cards = vec![
                Stat::new("Active clients", stats.active_clients),
                Stat::new("Appointments today", stats.appointments_today),
            ];
            if let Some(income) = stats
                .monthly_income_cents
                .filter(|_| ctx.session.has_permission(FINANCIAL))
            {
                cards.push(Stat::new("Income this month", format::money(income)));
            }
            if let Some(low) = stats
                .low_stock_items
                .filter(|_| ctx.session.has_permission(INVENTORY))
            {
                cards.push(Stat::new("Low stock items", low));
            }
            let title = match ctx.session.user_name() {
                Some(name) => format!("Welcome, {name}"),
                None => "Dashboard".to_string(),
            };
            Ok(PageContent::new(title, PageBody::Stats(cards)))
        })
    }

    fn prefetch<'a>(&'a self, ctx: &'a PageContext<B>) -> LocalBoxFuture<'a, Result<(), PageError>> {
        Box::pin(async move {
            Self::stats(ctx).await?;
            Ok(())
        })
    }
}
