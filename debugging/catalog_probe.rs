//! Hit a single TMDB endpoint through the catalog client and print the decoded result.
//! Usage:
//!   cargo run --bin catalog_probe -- popular|top_rated|now_playing|upcoming|discover [page]
//!   cargo run --bin catalog_probe -- trending day|week [page]
//!   cargo run --bin catalog_probe -- search <query> [page]
//!   cargo run --bin catalog_probe -- similar|recommendations <movie_id> [page]
//!   cargo run --bin catalog_probe -- details|trailer <movie_id>
//!   cargo run --bin catalog_probe -- genres
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use marquee::{CatalogApi, Endpoint, TmdbClient, TrendingWindow};
use serde_json::{json, Value};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Probe {
    List,
    Details,
    Trailer,
    Genres,
}

impl FromStr for Probe {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "popular" | "top_rated" | "now_playing" | "upcoming" | "discover" | "trending"
            | "search" | "similar" | "recommendations" => Ok(Probe::List),
            "details" => Ok(Probe::Details),
            "trailer" => Ok(Probe::Trailer),
            "genres" => Ok(Probe::Genres),
            other => Err(anyhow!("unknown endpoint '{}'", other)),
        }
    }
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    arg.ok_or_else(|| anyhow!("missing movie id"))?
        .parse()
        .context("movie id must be an integer")
}

fn parse_page(arg: Option<&String>) -> Result<u32> {
    arg.map(|p| p.parse().context("page must be an integer"))
        .transpose()
        .map(|p| p.unwrap_or(1))
}

fn list_endpoint(args: &[String]) -> Result<(Endpoint, u32)> {
    let name = args[1].to_lowercase();
    let (endpoint, rest) = match name.as_str() {
        "popular" => (Endpoint::Popular, 2),
        "top_rated" => (Endpoint::TopRated, 2),
        "now_playing" => (Endpoint::NowPlaying, 2),
        "upcoming" => (Endpoint::Upcoming, 2),
        "discover" => (Endpoint::Discover, 2),
        "trending" => {
            let window = match args.get(2).map(String::as_str) {
                Some("day") => TrendingWindow::Day,
                Some("week") => TrendingWindow::Week,
                _ => return Err(anyhow!("trending needs 'day' or 'week'")),
            };
            (Endpoint::Trending(window), 3)
        }
        "search" => {
            let query = args.get(2).ok_or_else(|| anyhow!("missing search query"))?;
            (Endpoint::Search(query.clone()), 3)
        }
        "similar" => (Endpoint::Similar(parse_id(args.get(2))?), 3),
        "recommendations" => (Endpoint::Recommendations(parse_id(args.get(2))?), 3),
        other => return Err(anyhow!("'{}' is not a list endpoint", other)),
    };
    Ok((endpoint, parse_page(args.get(rest))?))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin catalog_probe -- <endpoint> [arg] [page]");
        std::process::exit(1);
    }

    let probe = Probe::from_str(&args[1])?;
    let client = TmdbClient::from_env()?;

    let output: Value = match probe {
        Probe::List => {
            let (endpoint, page) = list_endpoint(&args)?;
            let data = client.fetch_page(&endpoint, page).await?;
            json!({
                "endpoint": endpoint.to_string(),
                "section": endpoint.section_label(),
                "response": data,
            })
        }
        Probe::Details => serde_json::to_value(client.details(parse_id(args.get(2))?).await?)?,
        Probe::Trailer => {
            let trailer = client.trailer(parse_id(args.get(2))?).await?;
            json!({
                "trailer": trailer,
                "watch_url": trailer.watch_url(),
                "embed_url": trailer.embed_url(),
            })
        }
        Probe::Genres => serde_json::to_value(client.genre_list().await?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
