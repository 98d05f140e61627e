use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendingWindow {
    Day,
    Week,
}

impl TrendingWindow {
    fn as_path(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

/// Every catalog query the client knows how to issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
    Trending(TrendingWindow),
    Discover,
    Search(String),
    Details(i64),
    Similar(i64),
    Recommendations(i64),
    GenreList,
    Trailer(i64),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Popular => "/movie/popular".to_string(),
            Endpoint::TopRated => "/movie/top_rated".to_string(),
            Endpoint::NowPlaying => "/movie/now_playing".to_string(),
            Endpoint::Upcoming => "/movie/upcoming".to_string(),
            Endpoint::Trending(window) => format!("/trending/movie/{}", window.as_path()),
            Endpoint::Discover => "/discover/movie".to_string(),
            Endpoint::Search(_) => "/search/movie".to_string(),
            Endpoint::Details(id) => format!("/movie/{id}"),
            Endpoint::Similar(id) => format!("/movie/{id}/similar"),
            Endpoint::Recommendations(id) => format!("/movie/{id}/recommendations"),
            Endpoint::GenreList => "/genre/movie/list".to_string(),
            Endpoint::Trailer(id) => format!("/movie/{id}/videos"),
        }
    }

    /// Label stamped on movies produced by this endpoint. `None` for
    /// endpoints that don't return a movie list.
    pub fn section_label(&self) -> Option<&'static str> {
        let label = match self {
            Endpoint::Popular => "Popular",
            Endpoint::TopRated => "Top Chart",
            Endpoint::NowPlaying => "Now Playing",
            Endpoint::Upcoming => "Coming Soon",
            Endpoint::Trending(TrendingWindow::Day) => "Trending Today",
            Endpoint::Trending(TrendingWindow::Week) => "Trending This Week",
            Endpoint::Discover => "Discover",
            Endpoint::Search(_) => "Search Results",
            Endpoint::Similar(_) => "Similar Movies",
            Endpoint::Recommendations(_) => "Recommended",
            Endpoint::Details(_) | Endpoint::GenreList | Endpoint::Trailer(_) => return None,
        };
        Some(label)
    }

    pub fn is_list(&self) -> bool {
        self.section_label().is_some()
    }

    /// Endpoint-specific query parameters, excluding api key, language and page.
    pub fn extra_query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Search(query) => vec![
                ("query", query.trim().to_string()),
                ("include_adult", "false".to_string()),
            ],
            Endpoint::Discover => vec![("sort_by", "popularity.desc".to_string())],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Search(query) => write!(f, "{} ('{}')", self.path(), query),
            _ => f.write_str(&self.path()),
        }
    }
}
