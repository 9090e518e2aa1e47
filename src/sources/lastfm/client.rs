//! Last.fm HTTP client
//!
//! Handles communication with the Last.fm 2.0 web service.
//! See: https://www.last.fm/api/intro
//!
//! Last.fm reports most failures as HTTP 200 with an `error` field in the
//! body, so every response goes through [`adapter::check`] instead of
//! relying on the status code.

use std::time::Duration;

use super::{adapter, dto};
use crate::config::LastFmConfig;
use crate::sources::domain::{
    SourceError, TopArtistsPage, TopArtistsRequest, TopTracksPage, TopTracksRequest,
};
use crate::sources::query_string;

/// Last.fm API client
pub struct LastFmClient {
    api_key: String,
    http_client: reqwest::Client,
    base_url: String,
}

impl LastFmClient {
    /// Create a new client with the given API key
    pub fn new(
        config: &LastFmConfig,
        api_key: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            http_client,
            base_url: config.base_url.clone(),
        })
    }

    /// Fetch the top artists for a tag
    pub async fn top_artists(
        &self,
        request: &TopArtistsRequest,
    ) -> Result<TopArtistsPage, SourceError> {
        let url = self.method_url(
            "tag.gettopartists",
            &[
                ("tag", request.tag.clone()),
                ("limit", request.limit.to_string()),
            ],
        );
        let response: dto::TopArtistsResponse = self.send(&url).await?;
        Ok(adapter::to_top_artists_page(response))
    }

    /// Fetch one page of an artist's top tracks
    pub async fn top_tracks(
        &self,
        request: &TopTracksRequest,
    ) -> Result<TopTracksPage, SourceError> {
        let url = self.method_url(
            "artist.gettoptracks",
            &[
                ("mbid", request.artist_id.clone()),
                ("page", request.page.to_string()),
                ("limit", request.limit.to_string()),
            ],
        );
        let response: dto::TopTracksResponse = self.send(&url).await?;
        Ok(adapter::to_top_tracks_page(response))
    }

    fn method_url(&self, method: &str, params: &[(&str, String)]) -> String {
        let mut all = vec![("method", method.to_string())];
        all.extend(params.iter().cloned());
        all.push(("api_key", self.api_key.clone()));
        all.push(("format", "json".to_string()));
        format!("{}?{}", self.base_url, query_string(&all))
    }

    /// Send the HTTP request and decode the body, checking for API errors
    async fn send<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        tracing::debug!(url = %redact(url), "Querying Last.fm");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        // Error bodies can also come with a 4xx status; prefer their message
        match serde_json::from_str::<dto::Envelope<T>>(&body) {
            Ok(envelope) => adapter::check(envelope),
            Err(_) if !status.is_success() => Err(SourceError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            ))),
            Err(e) => Err(SourceError::Parse(e.to_string())),
        }
    }
}

/// Hide the API key when logging request URLs
fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let end = url[start..].find('&').map_or(url.len(), |i| start + i);
            format!("{}api_key=***{}", &url[..start], &url[end..])
        }
        None => url.to_string(),
    }
}
