use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{normalize, ListPage, ListQuery};
use crate::error::FetchError;
use crate::session::Session;

use super::debounce::SearchDebouncer;
use super::downgrade::FilterDowngrade;
use super::pagination::{FilterState, PaginationState, PaginationStore};
use super::source::EntitySource;
use super::state::{EntityState, FetchPhase, RequestHandle};

/// What happened to one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Records and total were committed
    Committed { count: usize, total: u64 },
    /// An error message was committed
    Failed(FetchError),
    /// Superseded, cancelled, or unmounted: nothing was committed
    Discarded,
    /// No request was issued
    Skipped,
}

/// Read model handed to the rendering layer
#[derive(Debug, Clone, Serialize)]
pub struct EntityView<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: PaginationState,
    pub filters: FilterState,
    pub phase: FetchPhase,
}

/// Fetch orchestration for one entity screen.
///
/// Every change handler snapshots the query and installs a new request handle
/// under the state lock before any network I/O, so the last handler called is
/// the only one whose result can be committed.
pub struct EntityData<T> {
    source: Arc<dyn EntitySource<T>>,
    session: Session,
    state: Mutex<EntityState<T>>,
    store: Mutex<PaginationStore>,
    debouncer: Mutex<SearchDebouncer>,
    debounced_fields: Vec<String>,
    downgrade: Option<FilterDowngrade<T>>,
    fallback_fetch_limit: u32,
    mounted: AtomicBool,
}

pub struct EntityDataBuilder<T> {
    source: Arc<dyn EntitySource<T>>,
    session: Session,
    store: PaginationStore,
    debouncer: SearchDebouncer,
    debounced_fields: Vec<String>,
    downgrade: Option<FilterDowngrade<T>>,
    fallback_fetch_limit: u32,
}

impl<T: Clone + Send + Sync + 'static> EntityDataBuilder<T> {
    pub fn debounce<S: AsRef<str>>(mut self, fields: &[S], delay: std::time::Duration) -> Self {
        self.debounced_fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self.debouncer = SearchDebouncer::new(delay);
        self
    }

    pub fn downgrade(mut self, downgrade: FilterDowngrade<T>, fallback_fetch_limit: u32) -> Self {
        self.downgrade = Some(downgrade);
        self.fallback_fetch_limit = fallback_fetch_limit;
        self
    }

    pub fn build(self) -> Arc<EntityData<T>> {
        Arc::new(EntityData {
            source: self.source,
            session: self.session,
            state: Mutex::new(EntityState::new()),
            store: Mutex::new(self.store),
            debouncer: Mutex::new(self.debouncer),
            debounced_fields: self.debounced_fields,
            downgrade: self.downgrade,
            fallback_fetch_limit: self.fallback_fetch_limit,
            mounted: AtomicBool::new(true),
        })
    }
}

impl<T: Clone + Send + Sync + 'static> EntityData<T> {
    pub fn builder(
        source: impl EntitySource<T> + 'static,
        session: Session,
        store: PaginationStore,
    ) -> EntityDataBuilder<T> {
        EntityDataBuilder {
            source: Arc::new(source),
            session,
            store,
            debouncer: SearchDebouncer::new(std::time::Duration::from_millis(500)),
            debounced_fields: Vec::new(),
            downgrade: None,
            fallback_fetch_limit: 1000,
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Fetch the current page with the current filters
    pub async fn fetch(&self) -> FetchOutcome {
        if !self.is_mounted() {
            return FetchOutcome::Skipped;
        }
        let (handle, query) = self.begin().await;
        self.run(handle, query).await
    }

    /// Fetch in the background; the returned task resolves to the outcome
    pub fn refetch(self: &Arc<Self>) -> JoinHandle<FetchOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.fetch().await })
    }

    pub async fn on_page_change(&self, page: u32) -> FetchOutcome {
        self.store.lock().await.on_page_change(page);
        self.fetch().await
    }

    pub async fn on_page_size_change(&self, page_size: u32) -> FetchOutcome {
        if !self.store.lock().await.on_page_size_change(page_size) {
            tracing::warn!("{}: page size {} not offered, ignoring", self.name(), page_size);
            return FetchOutcome::Skipped;
        }
        self.fetch().await
    }

    /// Immediate filter commit; drops any pending debounced search
    pub async fn on_filter_change<K, V, I>(&self, patch: I) -> FetchOutcome
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.debouncer.lock().await.cancel();
        self.store.lock().await.on_filter_change(patch);
        self.fetch().await
    }

    /// Keystroke in a text filter. Debounced fields commit once input pauses;
    /// other fields commit immediately.
    pub async fn on_search_input(self: &Arc<Self>, field: &str, value: &str) {
        if !self.debounced_fields.iter().any(|f| f == field) {
            self.on_filter_change([(field.to_string(), value.to_string())]).await;
            return;
        }
        let this = Arc::downgrade(self);
        let patch = (field.to_string(), value.to_string());
        self.debouncer.lock().await.schedule(async move {
            if let Some(this) = this.upgrade() {
                this.store.lock().await.on_filter_change([patch]);
                this.fetch().await;
            }
        });
    }

    pub async fn on_clear_filters(&self) -> FetchOutcome {
        self.debouncer.lock().await.cancel();
        self.store.lock().await.on_clear_filters();
        self.fetch().await
    }

    /// Adjust page, size or filters without fetching (initial screen setup)
    pub async fn configure<F>(&self, f: F)
    where
        F: FnOnce(&mut PaginationStore),
    {
        f(&mut *self.store.lock().await);
    }

    pub async fn view(&self) -> EntityView<T> {
        let state = self.state.lock().await;
        let store = self.store.lock().await;
        EntityView {
            data: state.data().to_vec(),
            loading: state.loading(),
            error: state.error().map(str::to_string),
            pagination: store.pagination(),
            filters: store.filters().clone(),
            phase: state.phase(),
        }
    }

    pub async fn search_pending(&self) -> bool {
        self.debouncer.lock().await.is_pending()
    }

    /// Cancel the in-flight request and pending search; nothing commits afterwards
    pub async fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
        self.debouncer.lock().await.cancel();
        if self.state.lock().await.cancel_in_flight() {
            tracing::debug!("{}: unmounted with a request in flight", self.name());
        }
    }

    /// Clear records and error, keeping filters and page selection
    pub async fn reset(&self) {
        self.debouncer.lock().await.cancel();
        let mut state = self.state.lock().await;
        state.reset();
        self.store.lock().await.set_total(0);
    }

    /// Reset this screen whenever the session logs out
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.session.subscribe();
        let this: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.is_logout() => match this.upgrade() {
                        Some(data) => {
                            tracing::debug!("{}: session ended, clearing screen", data.name());
                            data.reset().await;
                        }
                        None => break,
                    },
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn begin(&self) -> (RequestHandle, ListQuery) {
        let mut state = self.state.lock().await;
        let query = self.store.lock().await.query();
        let handle = state.set_loading();
        tracing::debug!("{}: request #{} {:?}", self.name(), handle.id(), query.to_pairs());
        (handle, query)
    }

    async fn run(&self, handle: RequestHandle, query: ListQuery) -> FetchOutcome {
        let result = self.load(&query, handle.token()).await;
        self.settle(&handle, result).await
    }

    async fn load(&self, query: &ListQuery, cancel: &CancellationToken) -> Result<ListPage<T>, FetchError> {
        if self.session.require_credential().is_none() {
            return Err(FetchError::NoCredential);
        }

        let downgrade = match &self.downgrade {
            Some(downgrade) if downgrade.applies_to(query) => downgrade,
            _ => return self.load_page(query, cancel).await,
        };

        match self.load_page(query, cancel).await {
            Err(err) if err.is_server_rejection() => {
                let err = err.into_filter_rejection();
                tracing::warn!(
                    "{}: {}; retrying without {:?} and filtering locally",
                    self.name(), err, downgrade.fields()
                );
                self.load_downgraded(downgrade, query, cancel).await
            }
            other => other,
        }
    }

    async fn load_page(&self, query: &ListQuery, cancel: &CancellationToken) -> Result<ListPage<T>, FetchError> {
        let body = self.source.fetch(query, cancel).await?;
        let page = normalize(self.name(), body);
        let records = page
            .records
            .into_iter()
            .map(|raw| self.source.map_record(raw))
            .collect::<Result<Vec<T>, FetchError>>()?;
        Ok(ListPage { records, total: page.total })
    }

    /// One retry without the downgradable fields. `total` becomes the number
    /// of locally matching records and the requested page is sliced from them.
    async fn load_downgraded(
        &self,
        downgrade: &FilterDowngrade<T>,
        query: &ListQuery,
        cancel: &CancellationToken,
    ) -> Result<ListPage<T>, FetchError> {
        let (relaxed, removed) = downgrade.relax(query, self.fallback_fetch_limit);
        let fetched = self.load_page(&relaxed, cancel).await?;
        if fetched.total > fetched.records.len() as u64 {
            tracing::warn!(
                "{}: server reports {} records but only {} were fetched for local filtering",
                self.name(), fetched.total, fetched.records.len()
            );
        }

        let matching = downgrade.apply_locally(fetched.records, &removed);
        let total = matching.len() as u64;
        let size = query.page_size as usize;
        let start = (query.page.saturating_sub(1) as usize).saturating_mul(size);
        let records = matching.into_iter().skip(start).take(size).collect();
        Ok(ListPage { records, total })
    }

    async fn settle(&self, handle: &RequestHandle, result: Result<ListPage<T>, FetchError>) -> FetchOutcome {
        let mut state = self.state.lock().await;
        if !self.is_mounted() {
            tracing::debug!("{}: response #{} after unmount dropped", self.name(), handle.id());
            return FetchOutcome::Discarded;
        }
        if !state.owns(handle) {
            tracing::debug!("{}: stale response #{} dropped", self.name(), handle.id());
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(page) => {
                let count = page.records.len();
                self.store.lock().await.set_total(page.total);
                state.set_success(handle, page.records);
                tracing::debug!("{}: committed {} of {} records", self.name(), count, page.total);
                FetchOutcome::Committed { count, total: page.total }
            }
            Err(FetchError::Cancelled) => {
                // Only reachable if the source reported cancellation on its own
                tracing::warn!("{}: request #{} cancelled by its source", self.name(), handle.id());
                state.cancel_in_flight();
                FetchOutcome::Discarded
            }
            Err(err) => {
                tracing::info!("{}: request #{} failed: {}", self.name(), handle.id(), err.error_code());
                state.set_error(handle, err.user_message());
                FetchOutcome::Failed(err)
            }
        }
    }
}

impl<T> std::fmt::Debug for EntityData<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityData")
            .field("source", &self.source.name())
            .field("downgrade", &self.downgrade)
            .field("mounted", &self.mounted)
            .finish()
    }
}
