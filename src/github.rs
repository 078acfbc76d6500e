// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote source of records.
//!
//! Starvault reads two paginated listings from the GitHub REST API: the
//! repositories a user starred, and the pull requests a user authored. Both
//! listings are requested in descending creation order with a fixed page size
//! of [`PAGE_SIZE`]. A page holding fewer than [`PAGE_SIZE`] records is the
//! only signal that no more pages follow.
//!
//! # Endpoints
//!
//! - Stars: `GET /users/{user}/starred?sort=created&direction=desc`.
//! - Pull requests: `GET /search/issues?q=author:{user} type:pr&sort=created&order=desc`.
//!
//! The issue search endpoint never serves more than 1000 results. Pages past
//! that limit are answered with an empty page without touching the network.
//!
//! # See Also
//!
//! - [Starring](https://docs.github.com/en/rest/activity/starring)
//! - [Search issues and pull requests](https://docs.github.com/en/rest/search/search#search-issues-and-pull-requests)

pub mod model;

pub use model::{Label, Owner, PullRequest, PullRequestRef, RepoName, StarredRepo};

use crate::github::model::SearchResults;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, instrument};

/// Number of records requested per page.
pub const PAGE_SIZE: usize = 100;

/// Last page the issue search endpoint will serve.
pub const MAX_SEARCH_PAGE: u32 = 10;

/// Layer of indirection for paginated record listings.
///
/// Pages are numbered from 1.
pub trait RemoteSource {
    /// Fetch one page of repositories starred by user.
    fn starred_page(
        &self,
        username: &str,
        page: u32,
    ) -> impl Future<Output = Result<Vec<StarredRepo>>> + Send;

    /// Fetch one page of pull requests authored by user.
    fn pull_requests_page(
        &self,
        username: &str,
        page: u32,
    ) -> impl Future<Output = Result<Vec<PullRequest>>> + Send;
}

/// GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
}

impl GithubClient {
    /// Construct new GitHub client.
    ///
    /// The token, if given, is sent as bearer credential on every request.
    ///
    /// # Errors
    ///
    /// - Return [`GithubError::InvalidToken`] if token cannot be used as a
    ///   header value.
    /// - Return [`GithubError::Http`] if HTTP client cannot be built.
    pub fn new(api_url: impl AsRef<str>, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| GithubError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.as_ref().trim().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("GET {url} {query:?}");
        let response = self.client.get(url).query(query).send().await?;
        let response = map_status(response).await?;

        Ok(response.json::<T>().await?)
    }
}

impl RemoteSource for GithubClient {
    #[instrument(skip(self), level = "debug")]
    async fn starred_page(&self, username: &str, page: u32) -> Result<Vec<StarredRepo>> {
        let url = self.endpoint(&format!("/users/{username}/starred"));
        let query = [
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];

        self.get_json(&url, &query).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn pull_requests_page(&self, username: &str, page: u32) -> Result<Vec<PullRequest>> {
        if page > MAX_SEARCH_PAGE {
            debug!("issue search stops serving results past page {MAX_SEARCH_PAGE}");
            return Ok(Vec::new());
        }

        let url = self.endpoint("/search/issues");
        let query = [
            ("q", format!("author:{username} type:pr")),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("sort", "created".to_string()),
            ("order", "desc".to_string()),
        ];
        let results: SearchResults<PullRequest> = self.get_json(&url, &query).await?;

        Ok(results.items)
    }
}

async fn map_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "0");
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(body);

    Err(map_status_code(status, rate_limited, message))
}

fn map_status_code(status: StatusCode, rate_limited: bool, message: String) -> GithubError {
    match status {
        StatusCode::UNAUTHORIZED => GithubError::AuthInvalid,
        StatusCode::TOO_MANY_REQUESTS => GithubError::RateLimit,
        StatusCode::FORBIDDEN if rate_limited => GithubError::RateLimit,
        StatusCode::FORBIDDEN => GithubError::Forbidden,
        StatusCode::NOT_FOUND => GithubError::NotFound,
        status => GithubError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// All possible error types for GitHub interaction.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// Token rejected by GitHub.
    #[error("authentication failed, check the configured token")]
    AuthInvalid,

    /// Access to resource denied.
    #[error("permission denied")]
    Forbidden,

    /// API rate limit exhausted.
    #[error("rate limited, try again later or configure a token")]
    RateLimit,

    /// User or resource does not exist.
    #[error("not found, check the configured username")]
    NotFound,

    /// Token cannot be sent as header value.
    #[error("token contains characters that cannot be sent in a header")]
    InvalidToken,

    /// Unexpected response status.
    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport or decoding failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Friendly result alias :3
pub type Result<T, E = GithubError> = std::result::Result<T, E>;
