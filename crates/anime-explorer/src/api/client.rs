//! Jikan API client with rate limiting.

use super::error::ApiFailure;
use super::rate_limiter::RateLimiter;
use super::types::*;
use super::{AnimeApi, AnimePage};
use crate::models::{AnimeRecord, Genre};
use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use shared::config::ApiConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest page size the Jikan API accepts
pub const MAX_PAGE_LIMIT: u32 = 25;

/// Jikan API v4 client
pub struct JikanClient {
    /// HTTP client
    client: Client,
    /// Base URL for Jikan API
    base_url: String,
    /// Rate limiter
    rate_limiter: RateLimiter,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
        rate_limiter: RateLimiter,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    /// Create a client from the `[api]` configuration section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.timeout_ms),
            &config.user_agent,
            RateLimiter::new(
                config.rate_limit.requests_per_second,
                config.rate_limit.requests_per_minute,
            ),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a rate-limited GET request and return the raw body of a 2xx response
    async fn get_body(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, ApiFailure> {
        let url = format!("{}{}", self.base_url, endpoint);

        self.rate_limiter.acquire().await;
        debug!(url = %url, query = ?query, "Making API request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Request error");
                ApiFailure::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<JikanError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);

            warn!(url = %url, status = %status, error = %message, "Request failed");
            return Err(ApiFailure::from_status(status));
        }

        let body = response.text().await.map_err(ApiFailure::from)?;
        debug!(url = %url, bytes = body.len(), "Request successful");
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiFailure> {
        let body = self.get_body(endpoint, query).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(endpoint = endpoint, error = %e, "Failed to parse response");
            ApiFailure::MalformedResponse(e.to_string())
        })
    }

    /// Fetch all anime genres
    pub async fn fetch_genres(&self) -> Result<Vec<Genre>, ApiFailure> {
        info!("Fetching anime genres");
        let response: DataResponse<GenreItem> = self.get_json("/genres/anime", &[]).await?;
        Ok(response.data.into_iter().map(Genre::from).collect())
    }

    /// Fetch a single anime by MAL ID
    pub async fn fetch_anime(&self, mal_id: u32) -> Result<AnimeRecord, ApiFailure> {
        debug!(mal_id = mal_id, "Fetching anime details");
        let response: SingleResponse<JikanAnime> =
            self.get_json(&format!("/anime/{}", mal_id), &[]).await?;
        Ok(response.data.into())
    }
}

impl AnimeApi for JikanClient {
    async fn fetch_anime_list(
        &self,
        page: u32,
        limit: u32,
        genres: Option<&[u32]>,
    ) -> Result<AnimePage, ApiFailure> {
        info!(page = page, limit = limit, genres = ?genres, "Fetching anime list");
        let query = list_query(page, limit, genres);
        let body = self.get_body("/anime", &query).await?;
        parse_list_body(&body)
    }
}

/// Query parameters for `/anime`
pub(crate) fn list_query(page: u32, limit: u32, genres: Option<&[u32]>) -> Vec<(&'static str, String)> {
    let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];

    if let Some(ids) = genres.filter(|ids| !ids.is_empty()) {
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        query.push(("genres", joined));
    }

    query
}

/// Turn a listing body into a page.
///
/// A body that is not the expected JSON is a failure; a JSON body without a
/// `data` array is an empty success.
pub(crate) fn parse_list_body(body: &str) -> Result<AnimePage, ApiFailure> {
    let response: AnimeListResponse = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Failed to parse anime list response");
        ApiFailure::MalformedResponse(e.to_string())
    })?;

    let records = match response.data {
        Some(data) => data.into_iter().map(AnimeRecord::from).collect(),
        None => {
            warn!("Anime list response carried no data, treating as empty");
            Vec::new()
        }
    };

    Ok(AnimePage {
        records,
        has_next_page: response.pagination.map(|p| p.has_next_page),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = JikanClient::from_config(&shared::Config::default().api);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "https://api.jikan.moe/v4");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = JikanClient::new(
            "http://localhost:8080/v4/",
            Duration::from_secs(1),
            "test",
            RateLimiter::unlimited(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v4");
    }

    #[test]
    fn test_list_query() {
        assert_eq!(
            list_query(2, 25, None),
            vec![("page", "2".to_string()), ("limit", "25".to_string())]
        );
        assert_eq!(list_query(1, 10, Some(&[][..])).len(), 2);
        assert_eq!(
            list_query(1, 25, Some(&[1, 8, 46][..]))[2],
            ("genres", "1,8,46".to_string())
        );
    }

    #[test]
    fn test_parse_list_body() {
        let body = r#"{
            "pagination": {
                "last_visible_page": 1094,
                "has_next_page": true,
                "current_page": 1,
                "items": {"count": 2, "total": 27346, "per_page": 2}
            },
            "data": [
                {"mal_id": 1, "title": "Cowboy Bebop", "genres": [{"mal_id": 1, "type": "anime", "name": "Action", "url": ""}]},
                {"mal_id": 5, "title": "Cowboy Bebop: Tengoku no Tobira"}
            ]
        }"#;

        let page = parse_list_body(body).unwrap();
        assert_eq!(page.has_next_page, Some(true));
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].id, 1);
        assert_eq!(page.records[1].title, "Cowboy Bebop: Tengoku no Tobira");
    }

    #[test]
    fn test_parse_body_without_data_is_empty_success() {
        let page = parse_list_body(r#"{"pagination": {"has_next_page": false}}"#).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.has_next_page, Some(false));

        let page = parse_list_body("{}").unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.has_next_page, None);
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let result = parse_list_body("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(ApiFailure::MalformedResponse(_))));

        let result = parse_list_body(r#"{"data": [{"title": "no id"}]}"#);
        assert!(matches!(result, Err(ApiFailure::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_network_failure() {
        // Nothing listens on the discard port locally
        let client = JikanClient::new(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
            "test",
            RateLimiter::unlimited(),
        )
        .unwrap();

        let result = client.fetch_anime_list(1, 25, None).await;
        assert!(matches!(
            result,
            Err(ApiFailure::NetworkUnreachable(_)) | Err(ApiFailure::Timeout)
        ));
    }
}
