use serde::Deserialize;
use tracing::debug;

use super::{MetadataError, MovieCandidate, MovieMetadata};

pub const BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, PartialEq, Deserialize)]
pub struct Movie {
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Movie>,
}

/// TMDB v3 movie search, authenticated with a read access token.
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Movie>, MetadataError> {
        if self.token.is_empty() {
            return Err(MetadataError::MissingKey("TMDB"));
        }

        let url = format!("{}/search/movie", self.base_url);
        debug!(url = %url, query, "TMDB request");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MetadataError::Provider(format!(
                "TMDB returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results)
    }
}

#[async_trait::async_trait]
impl MovieMetadata for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<MovieCandidate>, MetadataError> {
        // Search titles are `+`-joined; the query string encoder takes spaces.
        let movies = self.search(&query.replace('+', " ")).await?;
        Ok(movies
            .into_iter()
            .map(|movie| MovieCandidate::from_release_date(movie.title, movie.release_date.as_deref()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    #[tokio::test]
    async fn test_search_movies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("query", "matrix reloaded"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "results": [
                    { "id": 604, "title": "The Matrix Reloaded", "release_date": "2003-05-15" },
                    { "id": 1, "title": "Reloaded", "release_date": "" },
                    { "id": 2, "title": "Untitled" }
                ]
            })))
            .mount(&server)
            .await;

        let client = TmdbClient::new(server.uri(), "secret");
        let movies = client.search_movies("matrix+reloaded").await.unwrap();

        assert_eq!(
            movies,
            vec![
                MovieCandidate {
                    title: "The Matrix Reloaded".to_string(),
                    release_year: Some(2003),
                },
                MovieCandidate {
                    title: "Reloaded".to_string(),
                    release_year: None,
                },
                MovieCandidate {
                    title: "Untitled".to_string(),
                    release_year: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_search_movies_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = TmdbClient::new(server.uri(), "bad");
        let result = client.search_movies("matrix").await;
        assert!(matches!(result, Err(MetadataError::Provider(_))));
    }

    #[tokio::test]
    async fn test_search_movies_without_token() {
        let client = TmdbClient::new(BASE_URL, "");
        let result = client.search_movies("matrix").await;
        assert!(matches!(result, Err(MetadataError::MissingKey("TMDB"))));
    }
}
