//! GitLab API client.
//!
//! Provides a [`RemoteSource`] over the issues of one GitLab project (API v4),
//! with token authentication and header-based pagination.

use crate::error::AppError;
use crate::models::{IssueDetails, IssueId, RemoteIssue};
use crate::services::remote_source::RemoteSource;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Largest page size GitLab accepts.
const MAX_PER_PAGE: usize = 100;

/// GitLab API client configuration.
#[derive(Debug, Clone)]
pub struct GitLabClientConfig {
    /// Presentable repository name.
    pub name: String,

    /// Base URL of the GitLab instance (e.g., `https://gitlab.com`).
    pub base_url: String,

    /// Project path with namespace or numeric project id.
    pub project: String,

    /// Personal access token for authentication.
    pub token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitLabClientConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_url: String::new(),
            project: String::new(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// GitLab API client bound to one project.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    config: GitLabClientConfig,
}

/// One page of a GitLab list endpoint.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Value of the `x-next-page` header; `None` on the last page.
    pub next_page: Option<u32>,
}

/// Query parameters for listing project issues.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssuesQuery {
    /// Search in title and description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Filter by state: `opened`, `closed`, `all`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Sort field: `created_at`, `updated_at`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    /// Sort direction: `asc` or `desc`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Page number for pagination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Number of items per page (max 100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// GitLab issue from API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabIssue {
    pub iid: i64,
    pub title: String,
    pub state: String,
    pub web_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub updated_at: String,
}

impl From<GitLabIssue> for RemoteIssue {
    fn from(issue: GitLabIssue) -> Self {
        Self {
            id: IssueId::new(issue.iid.to_string()),
            closed: issue.state == "closed",
            details: IssueDetails {
                summary: issue.title,
                web_url: Some(issue.web_url),
                labels: issue.labels,
                updated_at: parse_iso_timestamp(&issue.updated_at),
            },
        }
    }
}

/// Which pages cover `limit` items starting at `offset`.
///
/// Returns `(per_page, first_page, skip)`: `skip` items of the first page
/// precede `offset`.
fn page_window(offset: usize, limit: usize) -> (usize, usize, usize) {
    let per_page = limit.clamp(1, MAX_PER_PAGE);
    (per_page, offset / per_page + 1, offset % per_page)
}

impl GitLabClient {
    /// Create a new GitLab client.
    pub fn new(config: GitLabClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();

        // Add the private token header for authentication
        if !config.token.is_empty() {
            let token_value = header::HeaderValue::from_str(&config.token)
                .map_err(|_| AppError::authentication("Invalid token format"))?;
            headers.insert("PRIVATE-TOKEN", token_value);
        }

        // Build the HTTP client
        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the base URL for API requests.
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/v4{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    /// Issues endpoint of the configured project.
    fn issues_endpoint(&self) -> String {
        format!("/projects/{}/issues", urlencoding::encode(&self.config.project))
    }

    /// Page number GitLab reports as following this one.
    fn next_page(response: &Response) -> Option<u32> {
        response
            .headers()
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
    }

    /// Decode a successful response, or map the failure to an [`AppError`].
    async fn read_json<T: DeserializeOwned>(
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| AppError::internal(format!("Unexpected issue payload: {}", e)))
        } else if status == StatusCode::UNAUTHORIZED {
            Err(AppError::authentication(
                "GitLab token expired or revoked. Please re-authenticate.",
            ))
        } else {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            // GitLab returns errors as {"message": "..."} or {"error": "..."}
            let body_message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("message").or_else(|| v.get("error")).map(|m| match m.as_str() {
                        Some(s) => s.to_string(),
                        None => m.to_string(),
                    })
                });

            let message = match (status, body_message) {
                (StatusCode::FORBIDDEN, _) => "Access to the project denied".to_string(),
                (StatusCode::NOT_FOUND, _) => "Project not found".to_string(),
                (StatusCode::TOO_MANY_REQUESTS, _) => "Rate limit exceeded".to_string(),
                (_, Some(msg)) => msg,
                _ => format!("Request failed ({}): {}", status_code, body),
            };

            Err(AppError::remote_api_full(message, status_code, endpoint))
        }
    }

    /// List one page of the project's issues.
    pub async fn list_issues(&self, query: &IssuesQuery) -> Result<Page<GitLabIssue>, AppError> {
        let endpoint = self.issues_endpoint();
        let response = self
            .client
            .get(self.api_url(&endpoint))
            .query(query)
            .send()
            .await?;
        let next_page = Self::next_page(&response);
        let items = Self::read_json(response, &endpoint).await?;

        Ok(Page { items, next_page })
    }

    /// Get a single issue by IID. `Ok(None)` if GitLab reports it missing.
    pub async fn get_issue(&self, iid: i64) -> Result<Option<GitLabIssue>, AppError> {
        let endpoint = format!("{}/{}", self.issues_endpoint(), iid);
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_json(response, &endpoint).await.map(Some)
    }
}

#[async_trait]
impl RemoteSource for GitLabClient {
    fn presentable_name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_issues(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
        exclude_closed: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteIssue>, AppError> {
        let mut issues = Vec::new();
        if limit == 0 {
            return Ok(issues);
        }

        let (per_page, first_page, mut skip) = page_window(offset, limit);
        let mut page = first_page as u32;

        loop {
            let request = IssuesQuery {
                search: Some(query.trim().to_string()).filter(|q| !q.is_empty()),
                state: Some(if exclude_closed { "opened" } else { "all" }.to_string()),
                order_by: Some("created_at".to_string()),
                sort: Some("asc".to_string()),
                page: Some(page),
                per_page: Some(per_page as u32),
            };

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AppError::network("Request cancelled")),
                response = self.list_issues(&request) => response?,
            };

            let fetched = response.items.len();
            issues.extend(response.items.into_iter().skip(skip).map(RemoteIssue::from));
            skip = 0;

            if issues.len() >= limit {
                issues.truncate(limit);
                break;
            }
            match response.next_page {
                Some(next) if fetched > 0 => page = next,
                _ => break,
            }
        }

        log::debug!(
            "[gitlab] Fetched {} issue(s) from {}",
            issues.len(),
            self.config.name
        );
        Ok(issues)
    }

    async fn find_issue(&self, id: &IssueId) -> Result<Option<RemoteIssue>, AppError> {
        let iid: i64 = id
            .as_str()
            .parse()
            .map_err(|_| AppError::invalid_input_field(format!("Not a GitLab issue IID: {}", id), "id"))?;
        Ok(self.get_issue(iid).await?.map(RemoteIssue::from))
    }
}

/// Parse ISO 8601 timestamp to Unix timestamp.
fn parse_iso_timestamp(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp())
        .ok()
}
