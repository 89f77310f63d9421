//! TheTVDB v4 client.
//!
//! Logs in once with the project API key and reuses the bearer token for
//! every later request made through the same client.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::debug;

use super::{EpisodeCandidate, EpisodeLookup, MetadataError, SeriesCandidate, TvMetadata};

pub const BASE_URL: &str = "https://api4.thetvdb.com/v4";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Login {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    tvdb_id: Value,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesInfo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Episode {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesEpisodes {
    series: Option<SeriesInfo>,
    #[serde(default)]
    episodes: Option<Vec<Episode>>,
}

pub struct TvdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: OnceCell<String>,
}

impl TvdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            token: OnceCell::new(),
        }
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>, what: &str) -> Result<T, MetadataError> {
        if envelope.status != "success" {
            return Err(MetadataError::Provider(format!(
                "TVDB {} returned status '{}'",
                what, envelope.status
            )));
        }
        envelope
            .data
            .ok_or_else(|| MetadataError::Provider(format!("TVDB {} returned no data", what)))
    }

    async fn login(&self) -> Result<String, MetadataError> {
        if self.api_key.is_empty() {
            return Err(MetadataError::MissingKey("TVDB"));
        }

        let url = format!("{}/login", self.base_url);
        debug!(url = %url, "TVDB login");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "apikey": self.api_key, "pin": "" }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MetadataError::Provider(format!(
                "TVDB login returned {}",
                response.status()
            )));
        }

        let envelope: Envelope<Login> = response.json().await?;
        Ok(Self::unwrap_envelope(envelope, "login")?.token)
    }

    async fn token(&self) -> Result<&str, MetadataError> {
        self.token
            .get_or_try_init(|| self.login())
            .await
            .map(String::as_str)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, MetadataError> {
        let token = self.token().await?;

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?params, "TVDB request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MetadataError::Provider(format!(
                "TVDB {} returned {}",
                path,
                response.status()
            )));
        }

        let envelope: Envelope<T> = response.json().await?;
        Self::unwrap_envelope(envelope, path)
    }
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl TvMetadata for TvdbClient {
    fn name(&self) -> &str {
        "tvdb"
    }

    async fn search_series(&self, title: &str) -> Result<Vec<SeriesCandidate>, MetadataError> {
        let hits: Vec<SearchHit> = self
            .get(
                "/search",
                &[("query", title.to_string()), ("type", "series".to_string())],
            )
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| SeriesCandidate {
                id: id_string(&hit.tvdb_id),
                name: hit.name.unwrap_or_default(),
            })
            .collect())
    }

    async fn lookup_episodes(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<EpisodeLookup, MetadataError> {
        let data: SeriesEpisodes = self
            .get(
                &format!("/series/{}/episodes/default", series_id),
                &[
                    ("season", season.to_string()),
                    ("episodeNumber", episode.to_string()),
                ],
            )
            .await?;

        Ok(EpisodeLookup {
            series_name: data.series.and_then(|series| series.name),
            episodes: data
                .episodes
                .unwrap_or_default()
                .into_iter()
                .map(|episode| EpisodeCandidate {
                    name: episode.name.unwrap_or_default(),
                })
                .collect(),
        })
    }
}
