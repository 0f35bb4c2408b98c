//! `TmdbClient` - TMDB API client implementation.

use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::api::LocalTmdbApi;
use super::params::{DiscoverParams, ListingCategory, SearchParams};
use super::types::{
    MediaType, TmdbCredits, TmdbDetails, TmdbErrorResponse, TmdbGenreList, TmdbMediaResult,
    TmdbPage, TmdbPerson, TmdbPersonCredits, TmdbPersonDetails, TmdbReview, TmdbVideoList,
    TmdbWatchProviders,
};
use crate::error::{ApiError, ApiResult};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

/// How requests are authenticated.
#[derive(Debug, Clone)]
enum TmdbCredential {
    /// v3 key sent as the `api_key` query parameter.
    ApiKey(String),
    /// v4 read access token sent as `Authorization: Bearer`.
    Bearer(String),
}

/// TMDB API client.
///
/// Performs read-only GETs. There is no retry and no client-side
/// rate limiting; every failure surfaces as [`ApiError::Provider`].
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Credential attached to every request.
    credential: TmdbCredential,
    /// `language` query parameter.
    language: String,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    credential: Option<TmdbCredential>,
    user_agent: Option<String>,
    language: Option<String>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            credential: None,
            user_agent: None,
            language: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Authenticates with a v3 API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.credential = Some(TmdbCredential::ApiKey(key.into()));
        self
    }

    /// Authenticates with a v4 bearer token.
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(TmdbCredential::Bearer(token.into()));
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: "en-US").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - neither `api_key` nor `api_token` is set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> ApiResult<TmdbClient> {
        let credential = self.credential.ok_or_else(|| {
            ApiError::InvalidInput(String::from("api_key or api_token is required"))
        })?;
        let user_agent = self
            .user_agent
            .ok_or_else(|| ApiError::InvalidInput(String::from("user_agent is required")))?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| ApiError::InvalidInput(format!("invalid default base URL: {e}")))?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .map_err(|e| ApiError::provider("failed to build HTTP client", &e))?;

        Ok(TmdbClient {
            http_client,
            base_url,
            credential,
            language: self
                .language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Configured response language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Sends a GET request with credentials, language, and query params.
    #[instrument(skip_all)]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Provider(format!("failed to join URL path {path}: {e}")))?;

        let mut builder = self
            .http_client
            .get(url)
            .query(&[("language", self.language.as_str())])
            .query(query);
        builder = match &self.credential {
            TmdbCredential::ApiKey(key) => builder.query(&[("api_key", key.as_str())]),
            TmdbCredential::Bearer(token) => builder.bearer_auth(token),
        };
        let request = builder
            .build()
            .map_err(|e| ApiError::provider(&format!("failed to build request: {path}"), &e))?;

        tracing::debug!(path, "TMDB API request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| ApiError::provider(&format!("request failed: {path}"), &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            if let Ok(error_response) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                return Err(ApiError::Provider(format!(
                    "HTTP {status}: code={}, message={}",
                    error_response.status_code, error_response.status_message,
                )));
            }
            return Err(ApiError::Provider(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::provider(&format!("failed to read response body: {path}"), &e))?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Provider(format!("failed to decode JSON response {path}: {e}")))
    }
}

impl LocalTmdbApi for TmdbClient {
    #[instrument(skip(self))]
    async fn listing(
        &self,
        media: MediaType,
        category: ListingCategory,
        page: u32,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        let query = [("page", page.to_string())];
        self.get_json(category.path(media), &query).await
    }

    #[instrument(skip(self))]
    async fn details(&self, media: MediaType, id: u64) -> ApiResult<TmdbDetails> {
        let path = format!("{media}/{id}");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn credits(&self, media: MediaType, id: u64) -> ApiResult<TmdbCredits> {
        let path = format!("{media}/{id}/credits");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn videos(&self, media: MediaType, id: u64) -> ApiResult<TmdbVideoList> {
        let path = format!("{media}/{id}/videos");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn provider_reviews(
        &self,
        media: MediaType,
        id: u64,
        page: u32,
    ) -> ApiResult<TmdbPage<TmdbReview>> {
        let path = format!("{media}/{id}/reviews");
        let query = [("page", page.to_string())];
        self.get_json(&path, &query).await
    }

    #[instrument(skip(self))]
    async fn similar(&self, media: MediaType, id: u64) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        let path = format!("{media}/{id}/similar");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn recommendations(
        &self,
        media: MediaType,
        id: u64,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        let path = format!("{media}/{id}/recommendations");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn watch_providers(&self, media: MediaType, id: u64) -> ApiResult<TmdbWatchProviders> {
        let path = format!("{media}/{id}/watch/providers");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn discover(
        &self,
        media: MediaType,
        params: &DiscoverParams,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        let path = format!("discover/{media}");
        self.get_json(&path, &params.to_query()).await
    }

    #[instrument(skip(self))]
    async fn genres(&self, media: MediaType) -> ApiResult<TmdbGenreList> {
        let path = format!("genre/{media}/list");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        media: MediaType,
        params: &SearchParams,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        let path = format!("search/{media}");
        self.get_json(&path, &params.to_query()).await
    }

    #[instrument(skip(self))]
    async fn search_people(&self, params: &SearchParams) -> ApiResult<TmdbPage<TmdbPerson>> {
        self.get_json("search/person", &params.to_query()).await
    }

    #[instrument(skip(self))]
    async fn popular_people(&self, page: u32) -> ApiResult<TmdbPage<TmdbPerson>> {
        let query = [("page", page.to_string())];
        self.get_json("person/popular", &query).await
    }

    #[instrument(skip(self))]
    async fn person_details(&self, id: u64) -> ApiResult<TmdbPersonDetails> {
        let path = format!("person/{id}");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip(self))]
    async fn person_movie_credits(&self, id: u64) -> ApiResult<TmdbPersonCredits> {
        let path = format!("person/{id}/movie_credits");
        self.get_json(&path, &[]).await
    }
}
