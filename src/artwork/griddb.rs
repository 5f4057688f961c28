//! SteamGridDB v2 client (grid source)
//!
//! - `GET /search/autocomplete/{term}` -> `{ success, data: [{ id, name }] }`
//! - `GET /grids/game/{id}?dimensions=460x215,920x430` -> `{ success, data: [{ url }] }`

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::sources::{Dimensions, GridSource};
use crate::error::{ConfigError, SourceError};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    errors: Vec<String>,
}

impl<T> Envelope<T> {
    /// `success: false` is how the API says "nothing here"
    fn into_data(self) -> Result<Vec<T>, SourceError> {
        if self.success {
            Ok(self.data)
        } else if self.errors.is_empty() {
            Err(SourceError::miss("SteamGridDB reported no success"))
        } else {
            Err(SourceError::miss(self.errors.join("; ")))
        }
    }
}

#[derive(Debug, Deserialize)]
struct GameHit {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct GridHit {
    url: String,
}

#[derive(Clone)]
pub struct SteamGridDbClient {
    base: Url,
    client: Client,
}

impl SteamGridDbClient {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base = parse_base_url(api_url)?;

        let mut headers = header::HeaderMap::new();
        let bearer = header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            ConfigError::Invalid {
                name: "GRIDFILL_STEAMGRIDDB_API_KEY",
                message: e.to_string(),
            }
        })?;
        headers.insert(header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "http client",
                message: e.to_string(),
            })?;

        Ok(Self { base, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint(&self.base, segments)
    }

    async fn request<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("SteamGridDB request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(format!("SteamGridDB response read failed: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::miss("SteamGridDB returned 404"));
        }
        if !status.is_success() {
            return Err(SourceError::Transport(format!(
                "SteamGridDB request failed with status {status}: {body}"
            )));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| SourceError::Decode(format!("SteamGridDB response was malformed JSON: {e}")))?;
        envelope.into_data()
    }
}

#[async_trait]
impl GridSource for SteamGridDbClient {
    async fn search_title(&self, title: &str) -> Result<Vec<u64>, SourceError> {
        let url = self.endpoint(&["search", "autocomplete", title]);
        let hits: Vec<GameHit> = self.request(self.client.get(url)).await?;
        Ok(hits.into_iter().map(|hit| hit.id).collect())
    }

    async fn grid_urls(&self, game_id: u64, dimensions: &[Dimensions]) -> Result<Vec<String>, SourceError> {
        let mut url = self.endpoint(&["grids", "game", &game_id.to_string()]);
        if let Some(filter) = dimensions_query(dimensions) {
            url.query_pairs_mut().append_pair("dimensions", &filter);
        }
        let hits: Vec<GridHit> = self.request(self.client.get(url)).await?;
        Ok(hits.into_iter().map(|hit| hit.url).collect())
    }
}

/// Parse a base URL that path segments can be appended to
pub(crate) fn parse_base_url(api_url: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(api_url).map_err(|e| ConfigError::Invalid {
        name: "api url",
        message: format!("'{api_url}': {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            name: "api url",
            message: format!("'{api_url}' cannot take a path"),
        });
    }
    Ok(url)
}

/// Append percent-encoded path segments to a base URL
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn dimensions_query(dimensions: &[Dimensions]) -> Option<String> {
    if dimensions.is_empty() {
        return None;
    }
    Some(
        dimensions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    )
}
