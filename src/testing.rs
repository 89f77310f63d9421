//! In-memory metadata providers for tests.

use std::{collections::HashMap, sync::Mutex};

use crate::metadata::{
    EpisodeCandidate, EpisodeLookup, MetadataError, MovieCandidate, MovieMetadata,
    SeriesCandidate, TvMetadata,
};

#[derive(Default)]
pub struct FakeTv {
    pub series: HashMap<String, Vec<SeriesCandidate>>,
    pub episodes: HashMap<(String, u32, u32), EpisodeLookup>,
    pub searches: Mutex<Vec<String>>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeTv {
    pub fn with_series(mut self, query: &str, series: &[(&str, &str)]) -> Self {
        self.series.insert(
            query.to_string(),
            series
                .iter()
                .map(|(id, name)| SeriesCandidate {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn with_episode(
        mut self,
        id: &str,
        season: u32,
        episode: u32,
        series_name: Option<&str>,
        names: &[&str],
    ) -> Self {
        self.episodes.insert(
            (id.to_string(), season, episode),
            EpisodeLookup {
                series_name: series_name.map(String::from),
                episodes: names
                    .iter()
                    .map(|name| EpisodeCandidate {
                        name: name.to_string(),
                    })
                    .collect(),
            },
        );
        self
    }
}

#[async_trait::async_trait]
impl TvMetadata for FakeTv {
    fn name(&self) -> &str {
        "fake-tv"
    }

    async fn search_series(&self, title: &str) -> Result<Vec<SeriesCandidate>, MetadataError> {
        self.searches.lock().unwrap().push(title.to_string());
        self.series
            .get(title)
            .cloned()
            .ok_or_else(|| MetadataError::Provider(format!("no results for {}", title)))
    }

    async fn lookup_episodes(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<EpisodeLookup, MetadataError> {
        self.lookups.lock().unwrap().push(series_id.to_string());
        self.episodes
            .get(&(series_id.to_string(), season, episode))
            .cloned()
            .ok_or_else(|| MetadataError::Provider("404".to_string()))
    }
}

#[derive(Default)]
pub struct FakeMovies {
    pub movies: HashMap<String, Vec<MovieCandidate>>,
    pub searches: Mutex<Vec<String>>,
}

impl FakeMovies {
    pub fn with_movies(mut self, query: &str, movies: &[(&str, Option<u16>)]) -> Self {
        self.movies.insert(
            query.to_string(),
            movies
                .iter()
                .map(|(title, year)| MovieCandidate {
                    title: title.to_string(),
                    release_year: *year,
                })
                .collect(),
        );
        self
    }
}

#[async_trait::async_trait]
impl MovieMetadata for FakeMovies {
    fn name(&self) -> &str {
        "fake-movies"
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<MovieCandidate>, MetadataError> {
        self.searches.lock().unwrap().push(query.to_string());
        Ok(self.movies.get(query).cloned().unwrap_or_default())
    }
}
