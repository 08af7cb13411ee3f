//! GitHub REST client used to list member repositories.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use super::ApiError;
use crate::aggregator::{RepoFile, RepoLister};

/// Base URL of the GitHub REST API
const API_BASE_URL: &str = "https://api.github.com";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// GitHub rejects requests without a user agent
const USER_AGENT: &str = concat!("studyboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    html_url: Option<String>,
}

impl ContentEntry {
    fn into_repo_file(self) -> RepoFile {
        RepoFile {
            is_file: self.kind == "file",
            name: self.name,
            html_url: self.html_url,
        }
    }
}

/// GitHub API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(token: String) -> Result<Self, ApiError> {
        Self::with_base_url(token, API_BASE_URL.to_string())
    }

    /// Point the client at another API root (GitHub Enterprise)
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn contents_url(&self, org: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/contents/", self.base_url, org, repo)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let quota_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "0")
            .unwrap_or(false);
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body, quota_exhausted))
    }
}

#[async_trait]
impl RepoLister for GithubClient {
    async fn list_files(&self, org: &str, repo: &str) -> Result<Vec<RepoFile>, ApiError> {
        let url = self.contents_url(org, repo);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        let entries: Vec<ContentEntry> = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("contents of {}/{}: {}", org, repo, e)))?;
        debug!(org = org, repo = repo, count = entries.len(), "Listed repository root");

        Ok(entries.into_iter().map(ContentEntry::into_repo_file).collect())
    }
}
