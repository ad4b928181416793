//! Poster and trailer lookup for catalog movies.
//!
//! The recommendation engine never calls this crate. Presentation code
//! holds a `MediaLookup` and asks it for artwork next to the engine's
//! results, so the engine stays fully offline.
//!
//! Two implementations ship here:
//! - `TmdbClient`: the TMDB v3 REST API over reqwest
//! - `OfflineMedia`: answers `None` for everything (tests, no API key)

use async_trait::async_trait;
use data_loader::MovieId;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

const TMDB_API_URL: &str = "https://api.themoviedb.org/3";
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500/";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Errors that can occur when talking to the media service
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response from media service: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;

/// Capability to fetch artwork for a movie.
///
/// `Ok(None)` means the service answered but has nothing for this movie.
#[async_trait]
pub trait MediaLookup: Send + Sync {
    async fn poster_url(&self, movie_id: MovieId) -> Result<Option<String>>;

    async fn trailer_url(&self, movie_id: MovieId) -> Result<Option<String>>;
}

/// Lookup that never has any media
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineMedia;

#[async_trait]
impl MediaLookup for OfflineMedia {
    async fn poster_url(&self, _movie_id: MovieId) -> Result<Option<String>> {
        Ok(None)
    }

    async fn trailer_url(&self, _movie_id: MovieId) -> Result<Option<String>> {
        Ok(None)
    }
}

// =============================================================================
// TMDB responses
// =============================================================================

/// Subset of `GET /movie/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Element of `GET /movie/{id}/videos`
#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Full poster URL for a details response
pub fn poster_url_from(details: &MovieDetails) -> Option<String> {
    let path = details.poster_path.as_deref()?.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(format!("{POSTER_BASE_URL}{path}"))
}

/// First YouTube trailer of a video list
pub fn trailer_url_from(videos: &VideoList) -> Option<String> {
    videos
        .results
        .iter()
        .find(|video| video.kind == "Trailer" && video.site == "YouTube")
        .map(|video| format!("{YOUTUBE_WATCH_URL}{}", video.key))
}

// =============================================================================
// TMDB client
// =============================================================================

/// Client for the TMDB REST API
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    /// Create a client with a 10 second request timeout
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        info!("TMDB client ready");
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: TMDB_API_URL.to_string(),
        })
    }

    /// Point the client at another server (proxies, test doubles)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("TMDB returned {} for {}", status, path);
            return Err(MediaError::InvalidResponse(format!("status {status} for {path}")));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MediaLookup for TmdbClient {
    async fn poster_url(&self, movie_id: MovieId) -> Result<Option<String>> {
        let details: MovieDetails = self.get_json(&format!("/movie/{movie_id}")).await?;
        Ok(poster_url_from(&details))
    }

    async fn trailer_url(&self, movie_id: MovieId) -> Result<Option<String>> {
        let videos: VideoList = self.get_json(&format!("/movie/{movie_id}/videos")).await?;
        Ok(trailer_url_from(&videos))
    }
}
