//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.
//! Spacing between requests is the scheduler's job; this client only sends.

use std::time::Duration;

use super::{adapter, dto, xml};
use crate::config::{MusicBrainzConfig, ResponseFormat};
use crate::sources::domain::{RecordingSearchRequest, RecordingsPage, Source, SourceError};
use crate::sources::query_string;

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    format: ResponseFormat,
}

impl MusicBrainzClient {
    /// Create a new client
    pub fn new(config: &MusicBrainzConfig, user_agent: &str) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            format: config.format,
        })
    }

    /// Search the recordings credited to an artist, including artist credits
    pub async fn search_recordings(
        &self,
        request: &RecordingSearchRequest,
    ) -> Result<RecordingsPage, SourceError> {
        let response = self.send_search_request(request).await?;
        Ok(adapter::to_recordings_page(response))
    }

    fn search_url(&self, request: &RecordingSearchRequest) -> String {
        let params = [
            ("query", format!("arid:{}", request.artist_id)),
            ("limit", request.limit.to_string()),
            ("offset", request.offset.to_string()),
            ("inc", "artist-credits".to_string()),
            ("fmt", self.format.as_param().to_string()),
        ];
        format!("{}/recording?{}", self.base_url, query_string(&params))
    }

    /// Send the HTTP request and parse the response in the configured format
    async fn send_search_request(
        &self,
        request: &RecordingSearchRequest,
    ) -> Result<dto::SearchResponse, SourceError> {
        let url = self.search_url(request);
        tracing::debug!(url = %url, "Querying MusicBrainz");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();

        // MusicBrainz answers 503 when the rate limit is exceeded
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(SourceError::RateLimited);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<dto::ApiError>(&body) {
                return Err(SourceError::Api {
                    upstream: Source::MusicBrainz,
                    code: i64::from(status.as_u16()),
                    message: error.error,
                });
            }
            return Err(SourceError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        match self.format {
            ResponseFormat::Json => serde_json::from_str(&body)
                .map_err(|e| SourceError::Parse(e.to_string())),
            ResponseFormat::Xml => {
                xml::parse_search(&body).map_err(|e| SourceError::Parse(e.to_string()))
            }
        }
    }
}
