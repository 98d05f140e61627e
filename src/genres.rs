use futures::future::{BoxFuture, FutureExt, Shared};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::{Genre, Movie};
use crate::tmdb::CatalogApi;

type GenreTable = HashMap<i64, String>;
type LoadFuture = Shared<BoxFuture<'static, bool>>;

static FALLBACK_TABLE: Lazy<Arc<GenreTable>> = Lazy::new(|| {
    Arc::new(
        fallback_genres()
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect(),
    )
});

/// TMDB's movie genre list as of this writing. Used until a remote list loads.
pub fn fallback_genres() -> Vec<Genre> {
    [
        (28, "Action"),
        (12, "Adventure"),
        (16, "Animation"),
        (35, "Comedy"),
        (80, "Crime"),
        (99, "Documentary"),
        (18, "Drama"),
        (10751, "Family"),
        (14, "Fantasy"),
        (36, "History"),
        (27, "Horror"),
        (10402, "Music"),
        (9648, "Mystery"),
        (10749, "Romance"),
        (878, "Science Fiction"),
        (10770, "TV Movie"),
        (53, "Thriller"),
        (10752, "War"),
        (37, "Western"),
    ]
    .into_iter()
    .map(|(id, name)| Genre {
        id,
        name: name.to_string(),
    })
    .collect()
}

/// Genre id -> name lookups backed by the remote genre list.
///
/// Clones share the same table. Readers grab the current `Arc` snapshot, a
/// successful load swaps in a whole new table and a failed one leaves the
/// previous table untouched.
#[derive(Clone)]
pub struct GenreCache {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn CatalogApi>,
    table: RwLock<Arc<GenreTable>>,
    loaded: AtomicBool,
    in_flight: Mutex<Option<LoadFuture>>,
}

impl GenreCache {
    pub fn new(source: Arc<dyn CatalogApi>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                table: RwLock::new(Arc::clone(&FALLBACK_TABLE)),
                loaded: AtomicBool::new(false),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Refresh the table from the remote genre list.
    ///
    /// Callers arriving while a load is running wait on that same load. Returns
    /// whether a remote table was applied; failure is logged, never raised.
    pub async fn load(&self) -> bool {
        let pending = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let pending = inner.fetch_and_swap().boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    pub fn lookup(&self, id: i64) -> Option<String> {
        self.inner.table.read().get(&id).cloned()
    }

    /// Names for `ids` in input order; unknown ids are skipped.
    pub fn lookup_many(&self, ids: &[i64]) -> Vec<String> {
        let table = self.snapshot();
        ids.iter().filter_map(|id| table.get(id).cloned()).collect()
    }

    pub fn names_for(&self, movie: &Movie) -> Vec<String> {
        movie
            .genre_ids
            .as_deref()
            .map(|ids| self.lookup_many(ids))
            .unwrap_or_default()
    }

    /// True once any remote load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<GenreTable> {
        Arc::clone(&self.inner.table.read())
    }
}

impl Inner {
    async fn fetch_and_swap(self: Arc<Self>) -> bool {
        // A panicking source must still release the in-flight slot.
        let fetched = AssertUnwindSafe(self.source.genre_list())
            .catch_unwind()
            .await;
        let applied = match fetched {
            Ok(Ok(genres)) => {
                let table: GenreTable = genres.into_iter().map(|g| (g.id, g.name)).collect();
                let count = table.len();
                *self.table.write() = Arc::new(table);
                self.loaded.store(true, Ordering::Release);
                info!("Loaded {} genres", count);
                true
            }
            Ok(Err(e)) => {
                warn!("Failed to load genres, keeping current table: {}", e);
                false
            }
            Err(_) => {
                error!("Genre source panicked, keeping current table");
                false
            }
        };
        *self.in_flight.lock() = None;
        applied
    }
}
