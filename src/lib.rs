pub mod aggregate;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod genres;
pub mod models;
pub mod store;
pub mod tmdb;

#[cfg(test)]
mod testing;

pub use aggregate::{default_sections, fetch_bundle};
pub use config::CatalogConfig;
pub use endpoint::{Endpoint, TrendingWindow};
pub use error::CatalogError;
pub use genres::GenreCache;
pub use models::{Genre, LoadState, Movie, MovieDetails, MoviePage, Trailer};
pub use store::{MovieStore, Section, StoreOptions, StoreState};
pub use tmdb::{CatalogApi, TmdbClient};
