//! `SupabaseClient` - auth service and `PostgREST` table client.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use super::api::{LocalAuthApi, LocalUserDataApi};
use super::types::{
    ANONYMOUS, AuthUser, MovieSnapshot, Profile, Rating, ReviewEntry, ReviewWithAuthor, Session,
    UserStats, WatchlistEntry,
};
use crate::error::{ApiError, ApiResult};

/// Media type that makes `PostgREST` return a single object instead of an array.
const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// `PostgREST` error code for "zero rows where exactly one was requested".
const NOT_FOUND_CODE: &str = "PGRST116";

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Hosted user-data client.
///
/// Holds the signed-in session and authorises table requests with its
/// access token, falling back to the anon key when signed out.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SupabaseClient {
    /// HTTP client.
    http_client: Client,
    /// Project URL (with trailing slash).
    base_url: Url,
    /// Public anon key, sent as `apikey` on every request.
    anon_key: String,
    /// Current session.
    session: RwLock<Option<Session>>,
}

/// Builder for `SupabaseClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SupabaseClientBuilder {
    base_url: Option<Url>,
    anon_key: Option<String>,
    user_agent: Option<String>,
}

impl SupabaseClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            anon_key: None,
            user_agent: None,
        }
    }

    /// Sets the project URL (required).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the anon key (required).
    #[must_use]
    pub fn anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `base_url`, `anon_key`, or `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> ApiResult<SupabaseClient> {
        let mut base_url = self
            .base_url
            .ok_or_else(|| ApiError::InvalidInput(String::from("base_url is required")))?;
        let anon_key = self
            .anon_key
            .ok_or_else(|| ApiError::InvalidInput(String::from("anon_key is required")))?;
        let user_agent = self
            .user_agent
            .ok_or_else(|| ApiError::InvalidInput(String::from("user_agent is required")))?;

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .map_err(|e| ApiError::store("failed to build HTTP client", &e))?;

        Ok(SupabaseClient {
            http_client,
            base_url,
            anon_key,
            session: RwLock::new(None),
        })
    }
}

// --- Wire shapes ---

/// Error body of either the auth service or `PostgREST`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    /// `PostgREST` code (string) or auth HTTP code (number).
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn code(&self) -> Option<&str> {
        self.code.as_ref().and_then(serde_json::Value::as_str)
    }

    fn is_not_found(&self) -> bool {
        self.code() == Some(NOT_FOUND_CODE)
    }

    fn message(&self, raw: &str) -> String {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or(raw)
            .to_owned()
    }
}

/// Sign-up returns a session when confirmation is disabled, else the bare user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(AuthUser),
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    username: &'a str,
}

#[derive(Debug, Serialize)]
struct NewWatchlistRow<'a> {
    user_id: Uuid,
    movie_id: u64,
    title: &'a str,
    poster_path: Option<&'a str>,
    vote_average: Option<f64>,
    release_date: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ReviewRow<'a> {
    user_id: Uuid,
    movie_id: u64,
    rating: Rating,
    comment: &'a str,
    movie_title: &'a str,
    movie_poster: Option<&'a str>,
    updated_at: String,
}

#[derive(Debug, Serialize)]
struct ReviewPatch<'a> {
    rating: Rating,
    comment: &'a str,
    updated_at: String,
}

#[derive(Debug, Serialize)]
struct UsernamePatch<'a> {
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: i64,
}

#[derive(Debug, Deserialize)]
struct UsernameRow {
    id: Uuid,
    #[serde(default)]
    username: Option<String>,
}

/// Maps a failed table response to the error taxonomy.
fn classify_rest_error(status: StatusCode, error: &ErrorBody, raw: &str, context: &str) -> ApiError {
    let message = error.message(raw);
    if error.code() == Some(UNIQUE_VIOLATION_CODE) || status == StatusCode::CONFLICT {
        return ApiError::Conflict(message);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
        _ => ApiError::Store(format!("{context}: HTTP {status}: {message}")),
    }
}

/// Extracts the total from a `Content-Range` header (`0-9/42` or `*/0`).
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}

impl SupabaseClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> SupabaseClientBuilder {
        SupabaseClientBuilder::new()
    }

    /// Re-installs a previously persisted session.
    pub fn restore_session(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Current session without going through the trait.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take_session(&self) -> Option<Session> {
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn bearer(&self) -> String {
        self.current_session()
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token)
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Store(format!("failed to join URL path {path}: {e}")))
    }

    /// Starts a request with `apikey` and bearer headers.
    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self
            .http_client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer()))
    }

    fn table(&self, method: Method, table: &str) -> ApiResult<RequestBuilder> {
        self.request(method, &format!("rest/v1/{table}"))
    }

    /// Sends an auth-service request; every failure is `ApiError::Auth`.
    #[instrument(skip_all)]
    async fn send_auth<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> ApiResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Auth(format!("{context}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Auth(format!("{context}: {e}")))?;
        tracing::debug!(context, %status, "auth response");
        if !status.is_success() {
            let error = ErrorBody::parse(&body);
            return Err(ApiError::Auth(error.message(&body)));
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Auth(format!("{context}: failed to decode response: {e}")))
    }

    /// Sends a table request and fails on non-2xx.
    #[instrument(skip_all)]
    async fn send(&self, builder: RequestBuilder, context: &str) -> ApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::store(context, &e))?;
        let status = response.status();
        tracing::debug!(context, %status, "user data response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<failed to read body>"));
        Err(classify_rest_error(
            status,
            &ErrorBody::parse(&body),
            &body,
            context,
        ))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> ApiResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::store(context, &e))?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Store(format!("{context}: failed to decode response: {e}")))
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> ApiResult<Vec<T>> {
        let response = self.send(builder, context).await?;
        Self::decode(response, context).await
    }

    /// Writes with `return=representation` and returns the first row.
    async fn write_one<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> ApiResult<T> {
        let rows: Vec<T> = self.fetch_rows(builder, context).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::Store(format!("{context}: no row returned")))
    }

    /// Reads exactly one row; `PGRST116` becomes `None`.
    #[instrument(skip_all)]
    async fn fetch_single<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> ApiResult<Option<T>> {
        let response = builder
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| ApiError::store(context, &e))?;
        let status = response.status();
        if status.is_success() {
            return Self::decode(response, context).await.map(Some);
        }
        let body = response.text().await.unwrap_or_default();
        let error = ErrorBody::parse(&body);
        if error.is_not_found() {
            return Ok(None);
        }
        Err(classify_rest_error(status, &error, &body, context))
    }

    /// Counts rows with `Prefer: count=exact` on a HEAD request.
    async fn count(&self, table: &str, user_id: Uuid) -> ApiResult<u64> {
        let context = format!("count {table}");
        let builder = self
            .table(Method::HEAD, table)?
            .header("Prefer", "count=exact")
            .query(&[("select", String::from("id")), ("user_id", eq(user_id))]);
        let response = self.send(builder, &context).await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0);
        Ok(total)
    }

    /// Usernames for the given users; a failed lookup yields an empty list.
    async fn lookup_usernames(&self, user_ids: &[Uuid]) -> Vec<UsernameRow> {
        let ids: Vec<String> = user_ids.iter().map(ToString::to_string).collect();
        let builder = match self.table(Method::GET, "profiles") {
            Ok(b) => b.query(&[
                ("select", String::from("id,username")),
                ("id", format!("in.({})", ids.join(","))),
            ]),
            Err(e) => {
                tracing::warn!(error = %e, "username lookup skipped");
                return Vec::new();
            }
        };
        match self.fetch_rows(builder, "lookup usernames").await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "username lookup failed, authors shown as anonymous");
                Vec::new()
            }
        }
    }
}

/// `PostgREST` equality filter.
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

impl LocalAuthApi for SupabaseClient {
    #[instrument(skip_all)]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ApiResult<Option<Session>> {
        let body = SignUpBody {
            email,
            password,
            data: SignUpMetadata { username },
        };
        let builder = self.request(Method::POST, "auth/v1/signup")?.json(&body);
        let response: SignUpResponse = self.send_auth(builder, "sign up").await?;
        match response {
            SignUpResponse::Session(session) => {
                tracing::info!(user_id = %session.user.id, "signed up");
                self.restore_session(session.clone());
                Ok(Some(session))
            }
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "signed up, awaiting email confirmation");
                Ok(None)
            }
        }
    }

    #[instrument(skip_all)]
    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let builder = self
            .request(Method::POST, "auth/v1/token")?
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });
        let session: Session = self.send_auth(builder, "sign in").await?;
        tracing::info!(user_id = %session.user.id, "signed in");
        self.restore_session(session.clone());
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self) -> ApiResult<()> {
        let Some(session) = self.take_session() else {
            return Ok(());
        };
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .http_client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| ApiError::Auth(format!("sign out: {e}")))?;
        let status = response.status();
        // An expired token is already signed out server-side.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            tracing::info!(user_id = %session.user.id, "signed out");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Auth(ErrorBody::parse(&body).message(&body)))
    }

    async fn get_session(&self) -> ApiResult<Option<Session>> {
        Ok(self.current_session())
    }
}

impl LocalUserDataApi for SupabaseClient {
    #[instrument(skip(self, snapshot))]
    async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        movie_id: u64,
        snapshot: &MovieSnapshot,
    ) -> ApiResult<WatchlistEntry> {
        let row = [NewWatchlistRow {
            user_id,
            movie_id,
            title: &snapshot.title,
            poster_path: snapshot.poster_path.as_deref(),
            vote_average: snapshot.vote_average,
            release_date: snapshot.release_date.as_deref(),
        }];
        let builder = self
            .table(Method::POST, "watchlists")?
            .header("Prefer", "return=representation")
            .json(&row);
        self.write_one(builder, "add to watchlist").await
    }

    #[instrument(skip(self))]
    async fn remove_from_watchlist(&self, user_id: Uuid, movie_id: u64) -> ApiResult<()> {
        let builder = self
            .table(Method::DELETE, "watchlists")?
            .query(&[("user_id", eq(user_id)), ("movie_id", eq(movie_id))]);
        self.send(builder, "remove from watchlist").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_in_watchlist(&self, user_id: Uuid, movie_id: u64) -> ApiResult<bool> {
        let builder = self.table(Method::GET, "watchlists")?.query(&[
            ("select", String::from("id")),
            ("user_id", eq(user_id)),
            ("movie_id", eq(movie_id)),
        ]);
        let row: Option<IdRow> = self.fetch_single(builder, "watchlist membership").await?;
        Ok(row.is_some())
    }

    #[instrument(skip(self))]
    async fn list_watchlist(&self, user_id: Uuid) -> ApiResult<Vec<WatchlistEntry>> {
        let builder = self.table(Method::GET, "watchlists")?.query(&[
            ("select", String::from("*")),
            ("user_id", eq(user_id)),
            ("order", String::from("created_at.desc")),
        ]);
        self.fetch_rows(builder, "list watchlist").await
    }

    #[instrument(skip(self, content, snapshot))]
    async fn upsert_review(
        &self,
        user_id: Uuid,
        movie_id: u64,
        rating: Rating,
        content: &str,
        snapshot: &MovieSnapshot,
    ) -> ApiResult<ReviewEntry> {
        let row = [ReviewRow {
            user_id,
            movie_id,
            rating,
            comment: content,
            movie_title: &snapshot.title,
            movie_poster: snapshot.poster_path.as_deref(),
            updated_at: Utc::now().to_rfc3339(),
        }];
        let builder = self
            .table(Method::POST, "reviews")?
            .query(&[("on_conflict", "user_id,movie_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row);
        self.write_one(builder, "upsert review").await
    }

    #[instrument(skip(self, content))]
    async fn update_review(
        &self,
        review_id: i64,
        rating: Rating,
        content: &str,
    ) -> ApiResult<ReviewEntry> {
        let patch = ReviewPatch {
            rating,
            comment: content,
            updated_at: Utc::now().to_rfc3339(),
        };
        let builder = self
            .table(Method::PATCH, "reviews")?
            .query(&[("id", eq(review_id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        self.write_one(builder, "update review").await
    }

    #[instrument(skip(self))]
    async fn get_user_review(
        &self,
        user_id: Uuid,
        movie_id: u64,
    ) -> ApiResult<Option<ReviewEntry>> {
        let builder = self.table(Method::GET, "reviews")?.query(&[
            ("select", String::from("*")),
            ("user_id", eq(user_id)),
            ("movie_id", eq(movie_id)),
        ]);
        self.fetch_single(builder, "get user review").await
    }

    #[instrument(skip(self))]
    async fn delete_review(&self, review_id: i64) -> ApiResult<()> {
        let builder = self
            .table(Method::DELETE, "reviews")?
            .query(&[("id", eq(review_id))]);
        self.send(builder, "delete review").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_reviews_for_movie(&self, movie_id: u64) -> ApiResult<Vec<ReviewWithAuthor>> {
        let builder = self.table(Method::GET, "reviews")?.query(&[
            ("select", String::from("*")),
            ("movie_id", eq(movie_id)),
            ("order", String::from("created_at.desc")),
        ]);
        let reviews: Vec<ReviewEntry> = self.fetch_rows(builder, "list movie reviews").await?;
        if reviews.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<Uuid> = Vec::new();
        for review in &reviews {
            if !user_ids.contains(&review.user_id) {
                user_ids.push(review.user_id);
            }
        }
        let names = self.lookup_usernames(&user_ids).await;

        Ok(reviews
            .into_iter()
            .map(|review| {
                let username = names
                    .iter()
                    .find(|row| row.id == review.user_id)
                    .and_then(|row| row.username.clone())
                    .unwrap_or_else(|| String::from(ANONYMOUS));
                ReviewWithAuthor { review, username }
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_user_reviews(&self, user_id: Uuid) -> ApiResult<Vec<ReviewEntry>> {
        let builder = self.table(Method::GET, "reviews")?.query(&[
            ("select", String::from("*")),
            ("user_id", eq(user_id)),
            ("order", String::from("created_at.desc")),
        ]);
        self.fetch_rows(builder, "list user reviews").await
    }

    #[instrument(skip(self))]
    async fn get_profile(&self, user_id: Uuid) -> ApiResult<Option<Profile>> {
        let builder = self
            .table(Method::GET, "profiles")?
            .query(&[("select", String::from("*")), ("id", eq(user_id))]);
        self.fetch_single(builder, "get profile").await
    }

    #[instrument(skip(self))]
    async fn update_username(&self, user_id: Uuid, username: &str) -> ApiResult<Profile> {
        let builder = self
            .table(Method::PATCH, "profiles")?
            .query(&[("id", eq(user_id))])
            .header("Prefer", "return=representation")
            .json(&UsernamePatch { username });
        self.write_one(builder, "update username").await
    }

    #[instrument(skip(self))]
    async fn user_stats(&self, user_id: Uuid) -> ApiResult<UserStats> {
        let (watchlist_count, reviews_count) = tokio::try_join!(
            self.count("watchlists", user_id),
            self.count("reviews", user_id)
        )?;
        Ok(UserStats {
            watchlist_count,
            reviews_count,
        })
    }
}
