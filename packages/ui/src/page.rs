//! Pages, their runtime context, and the route to page table.

use api::{Backend, Query};
use futures::future::{select, Either, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use store::{CacheParams, Fetched, LocalCache};
use tokio_util::sync::CancellationToken;

use crate::content::PageContent;
use crate::error::{PageError, RegistryError};
use crate::route::Route;
use crate::session::AuthSession;

/// One screen's worth of behavior. A fresh instance is built per visit.
pub trait Page<B> {
    fn render<'a>(
        &'a mut self,
        ctx: &'a PageContext<B>,
    ) -> LocalBoxFuture<'a, Result<PageContent, PageError>>;

    /// Warm the cache with what `render` will need.
    fn prefetch<'a>(&'a self, _ctx: &'a PageContext<B>) -> LocalBoxFuture<'a, Result<(), PageError>> {
        Box::pin(async { Ok(()) })
    }

    /// Called when the page leaves the screen.
    fn destroy(&mut self) {}
}

pub type PageFactory<B> = Rc<dyn Fn() -> Box<dyn Page<B>>>;

pub struct PageContext<B> {
    pub backend: Rc<B>,
    pub session: Rc<AuthSession<B>>,
    pub cache: Rc<LocalCache>,
    pub route: Route,
    /// Cancelled when the page is torn down or its render times out.
    pub cancel: CancellationToken,
    pub force_refresh: bool,
}

impl<B: Backend> PageContext<B> {
    /// Run `work` until it finishes or the page is cancelled.
    pub async fn until_cancelled<T>(
        &self,
        work: impl Future<Output = Result<T, PageError>>,
    ) -> Result<T, PageError> {
        let work = pin!(work);
        let cancelled = pin!(self.cancel.cancelled());
        match select(work, cancelled).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => Err(PageError::Cancelled),
        }
    }

    /// Cache-aside read of `data_type`, abandoned on cancellation.
    pub async fn cached<T, F, Fut>(
        &self,
        data_type: &str,
        params: &CacheParams,
        fetch: F,
    ) -> Result<Fetched<T>, PageError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PageError>>,
    {
        self.until_cancelled(
            self.cache
                .get_or_fetch(data_type, params, self.force_refresh, fetch),
        )
        .await
    }

    /// A table read through the cache, keyed by the rendered query.
    pub async fn cached_select(
        &self,
        data_type: &str,
        query: &Query,
    ) -> Result<Fetched<Vec<serde_json::Value>>, PageError> {
        let params = CacheParams::from([
            ("table".to_string(), query.table_name().into()),
            ("query".to_string(), query.to_query_string().into()),
        ]);
        self.cached(data_type, &params, || async {
            Ok::<_, PageError>(self.backend.select(query).await?)
        })
        .await
    }
}

/// Route to page factory table, built once.
pub struct PageRegistry<B> {
    factories: BTreeMap<Route, PageFactory<B>>,
}

impl<B> Default for PageRegistry<B> {
    fn default() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }
}

impl<B: Backend> PageRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, route: Route, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Page<B>> + 'static,
    {
        self.factories.insert(route, Rc::new(factory));
        self
    }

    pub fn factory(&self, route: Route) -> Result<PageFactory<B>, RegistryError> {
        self.factories
            .get(&route)
            .cloned()
            .ok_or(RegistryError::UnknownRoute(route))
    }

    pub fn contains(&self, route: Route) -> bool {
        self.factories.contains_key(&route)
    }

    pub fn routes(&self) -> impl Iterator<Item = Route> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::MemoryBackend;
    use store::CacheConfig;

    struct Fixed;

    impl Page<MemoryBackend> for Fixed {
        fn render<'a>(
            &'a mut self,
            _ctx: &'a PageContext<MemoryBackend>,
        ) -> LocalBoxFuture<'a, Result<PageContent, PageError>> {
            Box::pin(async { Ok(PageContent::message("Fixed", "ok")) })
        }
    }

    fn context(backend: &MemoryBackend) -> PageContext<MemoryBackend> {
        let backend = Rc::new(backend.clone());
        PageContext {
            session: Rc::new(AuthSession::new(backend.clone(), Vec::new())),
            backend,
            cache: Rc::new(LocalCache::new(CacheConfig::default())),
            route: Route::Clients,
            cancel: CancellationToken::new(),
            force_refresh: false,
        }
    }

    #[test]
    fn test_missing_route_is_typed_error() {
        let registry = PageRegistry::<MemoryBackend>::new()
            .register(Route::Dashboard, || Box::new(Fixed));
        assert!(registry.factory(Route::Dashboard).is_ok());
        assert_eq!(
            registry.factory(Route::Reports).err(),
            Some(RegistryError::UnknownRoute(Route::Reports))
        );
    }

    #[tokio::test]
    async fn test_cached_select_reads_backend_once() {
        let backend = MemoryBackend::new();
        backend.insert_rows("clients", vec![serde_json::json!({ "id": "1" })]);
        let ctx = context(&backend);
        let query = Query::table("clients");

        let first = ctx.cached_select("clients", &query).await.unwrap();
        let second = ctx.cached_select("clients", &query).await.unwrap();
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(backend.select_count("clients"), 1);
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_work() {
        let backend = MemoryBackend::new();
        let ctx = context(&backend);
        ctx.cancel.cancel();
        let result = ctx
            .until_cancelled(futures::future::pending::<Result<(), PageError>>())
            .await;
        assert!(matches!(result, Err(PageError::Cancelled)));
    }
}
