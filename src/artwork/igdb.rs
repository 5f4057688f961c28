//! IGDB v4 client (cover source)
//!
//! IGDB takes Apicalypse query bodies over POST:
//! - `/games`: `search "<title>"; fields slug,cover; limit 10;`
//! - `/covers`: `fields url; where id = <id>;`
//!
//! Cover URLs come back as a template at thumbnail size, e.g.
//! `//images.igdb.com/igdb/image/upload/t_thumb/co1abc.jpg`.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::griddb::{endpoint, parse_base_url};
use super::sources::{CoverCandidate, CoverSource};
use crate::error::{ConfigError, SourceError};

/// Size tier in the URL template as returned
const TIER_THUMB: &str = "t_thumb";
/// Size tier we download
const TIER_COVER_BIG: &str = "t_cover_big";

const SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct GameHit {
    #[serde(default)]
    slug: String,
    cover: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CoverHit {
    url: Option<String>,
}

#[derive(Clone)]
pub struct IgdbClient {
    base: Url,
    client: Client,
}

impl IgdbClient {
    pub fn new(api_url: &str, client_id: &str, token: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base = parse_base_url(api_url)?;

        let invalid = |name: &'static str| {
            move |e: header::InvalidHeaderValue| ConfigError::Invalid {
                name,
                message: e.to_string(),
            }
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "client-id",
            header::HeaderValue::from_str(client_id).map_err(invalid("GRIDFILL_IGDB_CLIENT_ID"))?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(invalid("GRIDFILL_IGDB_TOKEN"))?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

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

    async fn query<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("IGDB request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(format!("IGDB response read failed: {e}")))?;

        if !status.is_success() {
            return Err(SourceError::Transport(format!(
                "IGDB request failed with status {status}: {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| SourceError::Decode(format!("IGDB response was malformed JSON: {e}")))
    }
}

#[async_trait]
impl CoverSource for IgdbClient {
    async fn search(&self, title: &str) -> Result<Vec<CoverCandidate>, SourceError> {
        let request = self
            .client
            .post(endpoint(&self.base, &["games"]))
            .body(search_query(title));
        let hits: Vec<GameHit> = self.query(request).await?;

        Ok(hits
            .into_iter()
            .map(|hit| CoverCandidate {
                slug: hit.slug,
                cover_id: hit.cover,
            })
            .collect())
    }

    async fn cover_url(&self, cover_id: u64) -> Result<String, SourceError> {
        let request = self
            .client
            .post(endpoint(&self.base, &["covers"]))
            .body(format!("fields url; where id = {cover_id};"));
        let hits: Vec<CoverHit> = self.query(request).await?;

        hits.into_iter()
            .find_map(|hit| hit.url)
            .map(|template| full_size_url(&template))
            .ok_or_else(|| SourceError::miss(format!("IGDB cover {cover_id} has no url")))
    }
}

/// Apicalypse search body with the title quoted
fn search_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!("search \"{escaped}\"; fields slug,cover; limit {SEARCH_LIMIT};")
}

/// Turn a thumbnail URL template into an absolute full-size cover URL
fn full_size_url(template: &str) -> String {
    let url = template.replacen(TIER_THUMB, TIER_COVER_BIG, 1);
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::http_fixture::{serve, Canned};

    async fn client_for(responses: Vec<Canned>) -> IgdbClient {
        let base = serve(responses).await;
        IgdbClient::new(&format!("{base}/v4"), "client", "tok", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn thumb_tier_becomes_cover_big() {
        assert_eq!(
            full_size_url("//images.igdb.com/igdb/image/upload/t_thumb/co1abc.jpg"),
            "https://images.igdb.com/igdb/image/upload/t_cover_big/co1abc.jpg"
        );
        assert_eq!(
            full_size_url("https://images.igdb.com/igdb/image/upload/t_thumb/co2.jpg"),
            "https://images.igdb.com/igdb/image/upload/t_cover_big/co2.jpg"
        );
    }

    #[test]
    fn search_query_escapes_quotes() {
        assert_eq!(
            search_query("The \"Best\" Game"),
            "search \"The \\\"Best\\\" Game\"; fields slug,cover; limit 10;"
        );
    }

    #[test]
    fn games_without_cover_deserialize() {
        let hits: Vec<GameHit> =
            serde_json::from_str(r#"[{"id":1,"slug":"celeste","cover":77},{"id":2,"slug":"no-art"}]"#).unwrap();
        assert_eq!(hits[0].cover, Some(77));
        assert_eq!(hits[1].cover, None);
        assert_eq!(hits[1].slug, "no-art");
    }

    #[test]
    fn client_rejects_bad_header_values() {
        let result = IgdbClient::new("https://api.igdb.com/v4", "bad\nid", "tok", Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "GRIDFILL_IGDB_CLIENT_ID", .. })
        ));
    }

    #[tokio::test]
    async fn search_keeps_hits_without_covers() {
        let client = client_for(vec![(
            200,
            r#"[{"id":1,"slug":"no-art"},{"id":2,"slug":"celeste","cover":77}]"#,
        )])
        .await;
        let hits = client.search("Celeste").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].cover_id, None);
        assert_eq!(hits[1].cover_id, Some(77));
    }

    #[tokio::test]
    async fn cover_url_is_rewritten_to_full_size() {
        let client = client_for(vec![(
            200,
            r#"[{"id":77,"url":"//images.igdb.com/igdb/image/upload/t_thumb/co77.jpg"}]"#,
        )])
        .await;
        assert_eq!(
            client.cover_url(77).await.unwrap(),
            "https://images.igdb.com/igdb/image/upload/t_cover_big/co77.jpg"
        );
    }

    #[tokio::test]
    async fn cover_without_url_is_a_miss() {
        let client = client_for(vec![(200, "[]")]).await;
        assert!(matches!(client.cover_url(77).await, Err(SourceError::LookupMiss(_))));
    }

    #[tokio::test]
    async fn error_status_and_bad_json_are_not_misses() {
        let client = client_for(vec![(401, r#"{"message":"Authorization Failure"}"#), (200, "{")]).await;
        assert!(matches!(client.search("Celeste").await, Err(SourceError::Transport(_))));
        assert!(matches!(client.search("Celeste").await, Err(SourceError::Decode(_))));
    }
}
