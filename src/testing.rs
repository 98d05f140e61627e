//! Scripted catalog double shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::endpoint::Endpoint;
use crate::error::CatalogError;
use crate::models::{Genre, Movie, MovieDetails, MoviePage, Trailer};
use crate::tmdb::CatalogApi;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Movies(Vec<Movie>),
    Timeout,
    Rejected,
    Empty,
}

impl Reply {
    fn into_result(self) -> Result<Vec<Movie>, CatalogError> {
        match self {
            Reply::Movies(movies) => Ok(movies),
            Reply::Timeout => Err(CatalogError::transport("operation timed out")),
            Reply::Rejected => Err(CatalogError::InvalidRequest("401 Unauthorized".into())),
            Reply::Empty => Err(CatalogError::EmptyResponse("no body".into())),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeCatalog {
    scripts: Mutex<HashMap<Endpoint, Vec<(Duration, Reply)>>>,
    genres: Mutex<Option<Vec<Genre>>>,
    genre_delay: Mutex<Duration>,
    genre_panics: AtomicBool,
    pub(crate) genre_calls: AtomicUsize,
    pub(crate) calls: Mutex<Vec<Endpoint>>,
}

impl FakeCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the endpoint. Replies are consumed in order; the
    /// last one repeats once the queue runs dry.
    pub(crate) fn reply(self, endpoint: Endpoint, delay_ms: u64, reply: Reply) -> Self {
        self.scripts
            .lock()
            .entry(endpoint)
            .or_default()
            .push((Duration::from_millis(delay_ms), reply));
        self
    }

    pub(crate) fn with_genres(self, genres: Option<Vec<Genre>>, delay_ms: u64) -> Self {
        *self.genres.lock() = genres;
        *self.genre_delay.lock() = Duration::from_millis(delay_ms);
        self
    }

    pub(crate) fn set_genres(&self, genres: Option<Vec<Genre>>) {
        *self.genres.lock() = genres;
    }

    /// Make the next `genre_list` call panic mid-flight.
    pub(crate) fn panic_on_next_genre_call(&self) {
        self.genre_panics.store(true, Ordering::SeqCst);
    }

    pub(crate) fn searches(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|e| match e {
                Endpoint::Search(q) => Some(q.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn call_count(&self, endpoint: &Endpoint) -> usize {
        self.calls.lock().iter().filter(|e| *e == endpoint).count()
    }

    fn next_reply(&self, endpoint: &Endpoint) -> (Duration, Reply) {
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(endpoint) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => (Duration::ZERO, Reply::Empty),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn fetch_page(
        &self,
        endpoint: &Endpoint,
        page: u32,
    ) -> Result<MoviePage, CatalogError> {
        self.calls.lock().push(endpoint.clone());
        let (delay, reply) = self.next_reply(endpoint);
        tokio::time::sleep(delay).await;
        let results = reply.into_result()?;
        Ok(MoviePage {
            page,
            total_pages: 1,
            total_results: results.len() as u32,
            results,
        })
    }

    async fn details(&self, id: i64) -> Result<MovieDetails, CatalogError> {
        self.calls.lock().push(Endpoint::Details(id));
        if id <= 0 {
            return Err(CatalogError::EmptyResponse(format!("no details for {id}")));
        }
        Ok(MovieDetails {
            id,
            title: format!("Movie {id}"),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: None,
            runtime: None,
            genres: Vec::new(),
            tagline: None,
            status: None,
        })
    }

    async fn trailer(&self, movie_id: i64) -> Result<Trailer, CatalogError> {
        self.calls.lock().push(Endpoint::Trailer(movie_id));
        Ok(Trailer {
            key: format!("key-{movie_id}"),
            name: "Official Trailer".into(),
            site: "YouTube".into(),
            kind: "Trailer".into(),
        })
    }

    async fn genre_list(&self) -> Result<Vec<Genre>, CatalogError> {
        self.genre_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.genre_delay.lock();
        tokio::time::sleep(delay).await;
        if self.genre_panics.swap(false, Ordering::SeqCst) {
            panic!("genre source blew up");
        }
        self.genres
            .lock()
            .clone()
            .ok_or_else(|| CatalogError::transport("genre service unavailable"))
    }
}

pub(crate) fn movie(id: i64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        overview: String::new(),
        poster_path: None,
        backdrop_path: None,
        release_date: None,
        vote_average: None,
        genre_ids: None,
        section_label: String::new(),
    }
}
