use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::endpoint::{Endpoint, TrendingWindow};
use crate::error::CatalogError;
use crate::models::{Genre, Movie, MovieDetails, MoviePage, Trailer};

/// TMDB refuses page numbers above this.
pub const MAX_PAGE: u32 = 500;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_page(&self, endpoint: &Endpoint, page: u32)
        -> Result<MoviePage, CatalogError>;
    async fn details(&self, id: i64) -> Result<MovieDetails, CatalogError>;
    async fn trailer(&self, movie_id: i64) -> Result<Trailer, CatalogError>;
    async fn genre_list(&self) -> Result<Vec<Genre>, CatalogError>;

    async fn fetch_movies(
        &self,
        endpoint: &Endpoint,
        page: u32,
    ) -> Result<Vec<Movie>, CatalogError> {
        Ok(self.fetch_page(endpoint, page).await?.results)
    }

    async fn popular(&self, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::Popular, page).await
    }

    async fn top_rated(&self, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::TopRated, page).await
    }

    async fn now_playing(&self, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::NowPlaying, page).await
    }

    async fn upcoming(&self, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::Upcoming, page).await
    }

    async fn trending(
        &self,
        window: TrendingWindow,
        page: u32,
    ) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::Trending(window), page).await
    }

    async fn discover(&self, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::Discover, page).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::Search(query.to_string()), page)
            .await
    }

    async fn similar(&self, id: i64, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::Similar(id), page).await
    }

    async fn recommendations(&self, id: i64, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.fetch_movies(&Endpoint::Recommendations(id), page).await
    }
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let user_agent = format!("marquee/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            language: config.language.clone(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&CatalogConfig::from_env()?)
    }

    fn url(&self, endpoint: &Endpoint, page: Option<u32>) -> String {
        let mut url = format!(
            "{}{}?api_key={}&language={}",
            self.base_url,
            endpoint.path(),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        );
        if let Some(page) = page {
            url.push_str(&format!("&page={page}"));
        }
        for (key, value) in endpoint.extra_query() {
            url.push_str(&format!("&{key}={}", urlencoding::encode(&value)));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        url: &str,
    ) -> Result<T, CatalogError> {
        debug!(endpoint = %endpoint, "GET");
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(status_error(endpoint, status, &text));
        }
        if text.trim().is_empty() {
            return Err(CatalogError::EmptyResponse(format!(
                "{endpoint} returned no body"
            )));
        }
        decode(&text)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn fetch_page(
        &self,
        endpoint: &Endpoint,
        page: u32,
    ) -> Result<MoviePage, CatalogError> {
        if !endpoint.is_list() {
            return Err(CatalogError::InvalidRequest(format!(
                "{endpoint} does not return a movie list"
            )));
        }
        if page == 0 || page > MAX_PAGE {
            return Err(CatalogError::InvalidRequest(format!(
                "page {page} is outside 1..={MAX_PAGE}"
            )));
        }
        if let Endpoint::Search(query) = endpoint {
            if query.trim().is_empty() {
                return Err(CatalogError::InvalidRequest(
                    "search query is empty".to_string(),
                ));
            }
        }
        let url = self.url(endpoint, Some(page));
        let page: MoviePage = self.get_json(endpoint, &url).await?;
        debug!(
            endpoint = %endpoint,
            page = page.page,
            count = page.results.len(),
            total_pages = page.total_pages,
            "Decoded movie page"
        );
        Ok(page)
    }

    async fn details(&self, id: i64) -> Result<MovieDetails, CatalogError> {
        let endpoint = Endpoint::Details(id);
        let url = self.url(&endpoint, None);
        self.get_json(&endpoint, &url).await
    }

    async fn trailer(&self, movie_id: i64) -> Result<Trailer, CatalogError> {
        let endpoint = Endpoint::Trailer(movie_id);
        let url = self.url(&endpoint, None);
        let videos: Videos = self.get_json(&endpoint, &url).await?;
        select_trailer(videos.results).ok_or_else(|| {
            CatalogError::EmptyResponse(format!("no YouTube trailer for movie {movie_id}"))
        })
    }

    async fn genre_list(&self) -> Result<Vec<Genre>, CatalogError> {
        let endpoint = Endpoint::GenreList;
        let url = self.url(&endpoint, None);
        let data: GenreListResponse = self.get_json(&endpoint, &url).await?;
        if data.genres.is_empty() {
            return Err(CatalogError::EmptyResponse(
                "genre list is empty".to_string(),
            ));
        }
        Ok(data.genres)
    }
}

#[derive(Debug, Deserialize)]
struct Videos {
    #[serde(default)]
    results: Vec<Trailer>,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CatalogError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        CatalogError::Decode {
            path: e.path().to_string(),
            source: e.into_inner(),
        }
    })?;
    deserializer.end().map_err(|source| CatalogError::Decode {
        path: ".".to_string(),
        source,
    })?;
    Ok(value)
}

fn status_error(endpoint: &Endpoint, status: StatusCode, body: &str) -> CatalogError {
    let message = format!("{endpoint} -> {status}: {}", body.trim());
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        CatalogError::InvalidRequest(message)
    } else {
        CatalogError::transport(message)
    }
}

fn select_trailer(videos: Vec<Trailer>) -> Option<Trailer> {
    videos
        .into_iter()
        .find(|v| v.site.eq_ignore_ascii_case("YouTube") && v.kind == "Trailer")
}
