//! Seams between the pipeline and the outside world
//!
//! The pipeline only talks to these traits. HTTP clients live in
//! `griddb.rs` and `igdb.rs`; tests use in-memory fakes.

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

use crate::error::{ConfigError, SourceError};

/// Image size filter for grid queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sizes Steam shows in the library grid
pub const LIBRARY_GRID_SIZES: [Dimensions; 2] = [Dimensions::new(460, 215), Dimensions::new(920, 430)];

/// Grid art database matched by title (SteamGridDB)
#[async_trait]
pub trait GridSource: Send + Sync {
    /// Candidate game ids for a title, best match first
    async fn search_title(&self, title: &str) -> Result<Vec<u64>, SourceError>;

    /// Grid image URLs for a game, best first. Empty `dimensions` means any size.
    async fn grid_urls(&self, game_id: u64, dimensions: &[Dimensions]) -> Result<Vec<String>, SourceError>;
}

/// A search hit from the cover database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverCandidate {
    pub slug: String,
    pub cover_id: Option<u64>,
}

/// Cover art database searched by free text (IGDB)
#[async_trait]
pub trait CoverSource: Send + Sync {
    async fn search(&self, title: &str) -> Result<Vec<CoverCandidate>, SourceError>;

    /// Full-resolution URL for a cover asset
    async fn cover_url(&self, cover_id: u64) -> Result<String, SourceError>;
}

/// Downloads image bytes exactly as served
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Plain HTTP GET, no auth headers
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gridfill/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "http client",
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Transport(format!(
                "image download failed with status {status}: {url}"
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SourceError::miss(format!("empty image at {url}")));
        }
        Ok(bytes.to_vec())
    }
}

/// First item of an ordered result, or a lookup miss
pub fn first_or_miss<T>(items: Vec<T>, what: &str) -> Result<T, SourceError> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::miss(what.to_string()))
}
