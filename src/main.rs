use anyhow::{Context, Result};
use dotenvy::dotenv;
use marquee::{
    CatalogApi, CatalogConfig, GenreCache, LoadState, Movie, MovieStore, StoreOptions, TmdbClient,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SEARCH_WAIT: Duration = Duration::from_secs(15);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[derive(Debug, Default)]
struct Args {
    search: Option<String>,
    trailer: Option<i64>,
    details: Option<i64>,
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--search" => {
                parsed.search = Some(args.next().context("--search needs a query")?);
            }
            "--trailer" => {
                let raw = args.next().context("--trailer needs a movie id")?;
                parsed.trailer = Some(raw.parse().context("movie id must be a number")?);
            }
            "--details" => {
                let raw = args.next().context("--details needs a movie id")?;
                parsed.details = Some(raw.parse().context("movie id must be a number")?);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

fn describe(movie: &Movie, genres: &GenreCache) -> String {
    let year = movie
        .release_year()
        .map(|y| format!(" ({y})"))
        .unwrap_or_default();
    let rating = movie
        .vote_average
        .map(|r| format!(" ★{r:.1}"))
        .unwrap_or_default();
    let names = genres.names_for(movie);
    let genre_list = if names.is_empty() {
        String::new()
    } else {
        format!(" [{}]", names.join(", "))
    };
    format!("{}{}{}{}", movie.title, year, rating, genre_list)
}

#[tokio::main]
async fn main() -> Result<()> {
    match dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    init_tracing();
    let args = parse_args()?;

    let config = CatalogConfig::from_env()?;
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::new(&config)?);
    let genres = GenreCache::new(catalog.clone());
    let store = MovieStore::new(catalog.clone(), StoreOptions::from_config(&config));

    if let Some(movie_id) = args.trailer {
        let trailer = store.trailer(movie_id).await?;
        println!("{} -> {}", trailer.name, trailer.watch_url());
        return Ok(());
    }

    if let Some(movie_id) = args.details {
        let details = store.details(movie_id).await?;
        let year = details
            .release_year()
            .map(|y| format!(" ({y})"))
            .unwrap_or_default();
        println!("{}{}", details.title, year);
        if let Some(runtime) = details.runtime {
            println!("  {runtime} min");
        }
        if let Some(poster) = details.poster_url() {
            println!("  {poster}");
        }
        println!("  {}", details.overview);
        return Ok(());
    }

    let (genres_loaded, _) = tokio::join!(genres.load(), store.load());
    if !genres_loaded {
        warn!("Using built-in genre names");
    }

    match store.load_state() {
        LoadState::Error(message) => warn!("{}", message),
        _ => {
            for section in store.sections() {
                println!("== {} ({})", section.label, section.movies.len());
                for movie in &section.movies {
                    println!("  {}", describe(movie, &genres));
                }
            }
        }
    }

    if let Some(query) = args.search {
        let mut rx = store.subscribe();
        store.set_query(query.clone());
        let state = tokio::time::timeout(SEARCH_WAIT, rx.wait_for(|s| !s.is_searching))
            .await
            .context("search timed out")?
            .context("store closed")?
            .clone();
        if let Some(message) = state.search_error {
            warn!("Search for '{}' failed: {}", query, message);
        } else {
            println!("== Results for '{}' ({})", query, state.search_results.len());
            for movie in &state.search_results {
                println!("  {}", describe(movie, &genres));
            }
        }
    }

    Ok(())
}
