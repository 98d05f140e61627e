use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::aggregate::{default_sections, fetch_bundle};
use crate::config::CatalogConfig;
use crate::endpoint::Endpoint;
use crate::error::CatalogError;
use crate::models::{LoadState, Movie, MovieDetails, Trailer};
use crate::tmdb::CatalogApi;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Endpoints fetched by `load`/`refresh`, in display order.
    pub sections: Vec<Endpoint>,
    pub debounce: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            debounce: Duration::from_millis(500),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            debounce: config.search_debounce,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub movies: Vec<Movie>,
    pub load_state: LoadState,
    pub query: String,
    pub search_results: Vec<Movie>,
    /// A search for `query` is pending or in flight.
    pub is_searching: bool,
    pub search_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub label: &'static str,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, Copy)]
enum FetchMode {
    Initial,
    Refresh,
    Retry,
}

/// Application-facing movie state.
///
/// State is published through a `watch` channel and every write is a single
/// `send_modify`, so completions never interleave. Search requests are tagged
/// with a generation number and only the newest generation may touch
/// `search_results`.
///
/// Background work runs on the runtime the store was built on, so the
/// synchronous methods (`set_query`, `clear_search`) may be called from any
/// thread.
#[derive(Clone)]
pub struct MovieStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    catalog: Arc<dyn CatalogApi>,
    options: StoreOptions,
    state: watch::Sender<StoreState>,
    search: Mutex<SearchControl>,
    runtime: Handle,
}

#[derive(Default)]
struct SearchControl {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl MovieStore {
    /// Build a store bound to the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a runtime; use [`MovieStore::with_runtime`]
    /// to pass a handle explicitly.
    pub fn new(catalog: Arc<dyn CatalogApi>, options: StoreOptions) -> Self {
        Self::with_runtime(catalog, options, Handle::current())
    }

    pub fn with_runtime(
        catalog: Arc<dyn CatalogApi>,
        options: StoreOptions,
        runtime: Handle,
    ) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            inner: Arc::new(StoreInner {
                catalog,
                options,
                state,
                search: Mutex::new(SearchControl::default()),
                runtime,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.inner.state.borrow().clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.inner.state.borrow().load_state.clone()
    }

    /// Initial fetch. Does nothing once movies are loaded or while loading.
    pub async fn load(&self) -> bool {
        self.fetch(FetchMode::Initial).await
    }

    /// Re-fetch every section. A failure keeps the movies already on screen.
    pub async fn refresh(&self) -> bool {
        self.fetch(FetchMode::Refresh).await
    }

    /// Re-fetch after an error; a no-op in any other state.
    pub async fn retry(&self) -> bool {
        self.fetch(FetchMode::Retry).await
    }

    /// Loaded movies grouped by section label, in configured order.
    pub fn sections(&self) -> Vec<Section> {
        let state = self.inner.state.borrow();
        let mut seen = Vec::new();
        let mut sections = Vec::new();
        for label in self
            .inner
            .options
            .sections
            .iter()
            .filter_map(Endpoint::section_label)
        {
            if seen.contains(&label) {
                continue;
            }
            seen.push(label);
            let movies: Vec<Movie> = state
                .movies
                .iter()
                .filter(|m| m.section_label == label)
                .cloned()
                .collect();
            if !movies.is_empty() {
                sections.push(Section { label, movies });
            }
        }
        sections
    }

    /// Record a new search query. Blank queries clear results immediately;
    /// anything else is sent once the query has been stable for the debounce
    /// window.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let blank = query.trim().is_empty();

        let mut control = self.inner.search.lock();
        control.generation += 1;
        let generation = control.generation;
        if let Some(timer) = control.timer.take() {
            timer.abort();
        }

        self.inner.state.send_modify(|state| {
            state.query = query.clone();
            state.search_error = None;
            state.is_searching = !blank;
            if blank {
                state.search_results.clear();
            }
        });
        if blank {
            return;
        }

        let inner = Arc::clone(&self.inner);
        control.timer = Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep(inner.options.debounce).await;
            inner.dispatch_search(generation, query);
        }));
    }

    pub fn clear_search(&self) {
        self.set_query(String::new());
    }

    pub async fn trailer(&self, movie_id: i64) -> Result<Trailer, CatalogError> {
        match self.inner.catalog.trailer(movie_id).await {
            Ok(trailer) => {
                debug!("Trailer for movie {}: {}", movie_id, trailer.key);
                Ok(trailer)
            }
            Err(e) => {
                warn!("No trailer for movie {}: {}", movie_id, e);
                Err(e)
            }
        }
    }

    pub async fn details(&self, movie_id: i64) -> Result<MovieDetails, CatalogError> {
        self.inner.catalog.details(movie_id).await
    }

    async fn fetch(&self, mode: FetchMode) -> bool {
        let started = self.inner.state.send_if_modified(|state| {
            if state.load_state.is_loading() {
                return false;
            }
            let allowed = match (mode, &state.load_state) {
                (FetchMode::Initial, LoadState::Loaded) => false,
                (FetchMode::Initial, _) | (FetchMode::Refresh, _) => true,
                (FetchMode::Retry, LoadState::Error(_)) => true,
                (FetchMode::Retry, _) => false,
            };
            if allowed {
                state.load_state = LoadState::Loading;
            }
            allowed
        });
        if !started {
            debug!("Skipping {:?} fetch in state {:?}", mode, self.load_state());
            return false;
        }

        // Run detached so a dropped caller can't leave the store stuck in Loading.
        let inner = Arc::clone(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            info!("Fetching {} catalog sections", inner.options.sections.len());
            let result = fetch_bundle(&inner.catalog, &inner.options.sections).await;
            inner.apply_bundle(result);
        });
        if let Err(e) = task.await {
            error!("Catalog fetch task failed: {}", e);
            self.inner
                .apply_bundle(Err(CatalogError::transport(e.to_string())));
        }
        true
    }
}

impl StoreInner {
    fn apply_bundle(&self, result: Result<Vec<Movie>, CatalogError>) {
        self.state.send_modify(|state| match result {
            Ok(movies) => {
                info!("Loaded {} movies", movies.len());
                state.movies = movies;
                state.load_state = LoadState::Loaded;
            }
            Err(e) => {
                warn!(
                    "Catalog load failed, keeping {} movies: {}",
                    state.movies.len(),
                    e
                );
                state.load_state = LoadState::Error(e.user_message());
            }
        });
    }

    fn dispatch_search(self: Arc<Self>, generation: u64, query: String) {
        if self.search.lock().generation != generation {
            return;
        }
        debug!("Searching for '{}'", query);
        // Detached from the timer: a newer query may abort the timer, but an
        // in-flight request always finishes and is filtered on arrival.
        let runtime = self.runtime.clone();
        runtime.spawn(async move {
            let result = self.catalog.search(&query, 1).await;
            self.apply_search(generation, &query, result);
        });
    }

    fn apply_search(
        &self,
        generation: u64,
        query: &str,
        result: Result<Vec<Movie>, CatalogError>,
    ) {
        let control = self.search.lock();
        if control.generation != generation {
            debug!("Discarding stale results for '{}'", query);
            return;
        }
        self.state.send_if_modified(|state| {
            if state.query != query {
                return false;
            }
            state.is_searching = false;
            match result {
                Ok(movies) => {
                    let label = Endpoint::Search(String::new())
                        .section_label()
                        .unwrap_or_default();
                    state.search_results = movies
                        .into_iter()
                        .map(|mut m| {
                            m.section_label = label.to_string();
                            m
                        })
                        .collect();
                    state.search_error = None;
                }
                Err(e) => {
                    warn!("Search for '{}' failed: {}", query, e);
                    state.search_results.clear();
                    state.search_error = Some(e.user_message());
                }
            }
            true
        });
    }
}
