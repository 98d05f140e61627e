use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::endpoint::{Endpoint, TrendingWindow};
use crate::error::CatalogError;
use crate::models::Movie;
use crate::tmdb::CatalogApi;

/// Sections shown on the home screen, in display order.
pub fn default_sections() -> Vec<Endpoint> {
    vec![
        Endpoint::Popular,
        Endpoint::TopRated,
        Endpoint::Upcoming,
        Endpoint::Trending(TrendingWindow::Day),
        Endpoint::Trending(TrendingWindow::Week),
    ]
}

/// Fetch page one of every endpoint concurrently and merge the results.
///
/// Each movie is tagged with the label of the endpoint that returned it.
/// Movies arrive grouped per endpoint in completion order, so the order across
/// endpoints is not stable. Failures are logged and skipped; the first one
/// (in completion order) is returned only when nothing at all came back.
pub async fn fetch_bundle(
    catalog: &Arc<dyn CatalogApi>,
    endpoints: &[Endpoint],
) -> Result<Vec<Movie>, CatalogError> {
    let mut tasks = JoinSet::new();
    for endpoint in endpoints.iter().cloned() {
        let catalog = Arc::clone(catalog);
        tasks.spawn(async move {
            let result = catalog.fetch_movies(&endpoint, 1).await;
            (endpoint, result)
        });
    }

    let mut movies = Vec::new();
    let mut first_failure: Option<CatalogError> = None;
    let mut failures = 0usize;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((endpoint, Ok(batch))) => {
                let label = endpoint.section_label().unwrap_or_default();
                debug!("{} returned {} movies", endpoint, batch.len());
                movies.extend(batch.into_iter().map(|mut movie| {
                    movie.section_label = label.to_string();
                    movie
                }));
            }
            Ok((endpoint, Err(e))) => {
                warn!("Failed to fetch {}: {}", endpoint, e);
                failures += 1;
                first_failure.get_or_insert(e);
            }
            Err(e) => {
                error!("Catalog fetch task panicked: {}", e);
                failures += 1;
                first_failure.get_or_insert(CatalogError::transport(e.to_string()));
            }
        }
    }

    match first_failure {
        Some(err) if movies.is_empty() => Err(err),
        _ => {
            if failures > 0 {
                warn!(
                    "Partial catalog load: {} of {} endpoints failed, {} movies kept",
                    failures,
                    endpoints.len(),
                    movies.len()
                );
            }
            Ok(movies)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{movie, FakeCatalog, Reply};

    fn catalog(fake: FakeCatalog) -> Arc<dyn CatalogApi> {
        Arc::new(fake)
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_still_returns_the_successes() {
        let fake = FakeCatalog::new()
            .reply(Endpoint::Popular, 10, Reply::Movies(vec![movie(1, "Dune")]))
            .reply(Endpoint::TopRated, 30_000, Reply::Timeout);

        let movies = fetch_bundle(&catalog(fake), &[Endpoint::Popular, Endpoint::TopRated])
            .await
            .expect("one endpoint succeeded");

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, 1);
        assert_eq!(movies[0].section_label, "Popular");
    }

    #[tokio::test(start_paused = true)]
    async fn total_failure_reports_first_failure_to_arrive() {
        let fake = FakeCatalog::new()
            .reply(Endpoint::Popular, 200, Reply::Timeout)
            .reply(Endpoint::TopRated, 50, Reply::Rejected)
            .reply(Endpoint::Upcoming, 100, Reply::Empty);

        let err = fetch_bundle(
            &catalog(fake),
            &[Endpoint::Popular, Endpoint::TopRated, Endpoint::Upcoming],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CatalogError::InvalidRequest(_)), "{err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn every_movie_is_labelled_by_its_source() {
        let day = Endpoint::Trending(TrendingWindow::Day);
        let fake = FakeCatalog::new()
            .reply(
                Endpoint::Popular,
                20,
                Reply::Movies(vec![movie(1, "A"), movie(2, "B")]),
            )
            .reply(Endpoint::Upcoming, 5, Reply::Movies(vec![movie(3, "C")]))
            // Same movie from two endpoints stays duplicated.
            .reply(day.clone(), 10, Reply::Movies(vec![movie(1, "A")]));

        let movies = fetch_bundle(
            &catalog(fake),
            &[Endpoint::Popular, Endpoint::Upcoming, day],
        )
        .await
        .unwrap();

        let labels: Vec<(i64, &str)> = movies
            .iter()
            .map(|m| (m.id, m.section_label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (3, "Coming Soon"),
                (1, "Trending Today"),
                (1, "Popular"),
                (2, "Popular"),
            ]
        );
    }

    #[tokio::test]
    async fn all_empty_successes_is_an_empty_success() {
        let fake = FakeCatalog::new().reply(Endpoint::Discover, 0, Reply::Movies(vec![]));
        let movies = fetch_bundle(&catalog(fake), &[Endpoint::Discover])
            .await
            .unwrap();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn issues_one_request_per_endpoint() {
        let fake = Arc::new(
            FakeCatalog::new()
                .reply(Endpoint::Popular, 0, Reply::Movies(vec![movie(1, "A")]))
                .reply(Endpoint::TopRated, 0, Reply::Movies(vec![movie(2, "B")])),
        );
        let dyn_catalog: Arc<dyn CatalogApi> = fake.clone();
        let sections = default_sections();
        let _ = fetch_bundle(&dyn_catalog, &sections).await;
        for endpoint in &sections {
            assert_eq!(fake.call_count(endpoint), 1, "{endpoint}");
        }
    }
}
