pub mod tmdb;
pub mod tvdb;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("missing API key for {0}")]
    MissingKey(&'static str),
}

/// A series returned by a TV search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCandidate {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeCandidate {
    pub name: String,
}

/// Episodes of one series matching a season/episode pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EpisodeLookup {
    /// Canonical series name, when the provider returns one with the episodes.
    pub series_name: Option<String>,
    pub episodes: Vec<EpisodeCandidate>,
}

/// A movie returned by a movie search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieCandidate {
    pub title: String,
    pub release_year: Option<u16>,
}

impl MovieCandidate {
    /// Build a candidate from a `YYYY-MM-DD` release date; anything without a
    /// parseable, non-zero year leading it has no year.
    pub fn from_release_date(title: impl Into<String>, release_date: Option<&str>) -> Self {
        let release_year = release_date
            .and_then(|date| date.split('-').next())
            .and_then(|year| year.parse().ok())
            .filter(|year| *year > 0);
        Self {
            title: title.into(),
            release_year,
        }
    }
}

#[async_trait::async_trait]
pub trait TvMetadata: Send + Sync {
    fn name(&self) -> &str;

    /// Search series by title, in provider ranking order.
    async fn search_series(&self, title: &str) -> Result<Vec<SeriesCandidate>, MetadataError>;

    /// Episodes of `series_id` numbered `season`/`episode`.
    async fn lookup_episodes(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<EpisodeLookup, MetadataError>;
}

#[async_trait::async_trait]
pub trait MovieMetadata: Send + Sync {
    fn name(&self) -> &str;

    /// Search movies by a `+`-separated query, in provider ranking order.
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieCandidate>, MetadataError>;
}
