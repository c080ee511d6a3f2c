//! GitHub REST v3 client for pull request conversation comments.
//!
//! Endpoints used:
//!   * GET   /user
//!   * GET   /repos/{owner}/{repo}/issues/{number}
//!   * GET   /repos/{owner}/{repo}/issues/{number}/comments
//!   * POST  /repos/{owner}/{repo}/issues/{number}/comments
//!   * PATCH /repos/{owner}/{repo}/issues/comments/{comment_id}

use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::{ConfigError, HubError, HubResult, ProviderError};
use crate::reference::PullRequestRef;
use crate::types::{Issue, IssueComment, User};

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size for list endpoints (GitHub maximum).
const PER_PAGE: usize = 100;

/// Upper bound on pages fetched for a single listing.
const MAX_PAGES: u32 = 50;

/// Runtime configuration for the client.
#[derive(Clone)]
pub struct HubConfig {
    /// API base, e.g. "https://api.github.com" or "https://ghe.example.com/api/v3".
    pub base_api: String,
    /// Personal access or app token.
    pub token: String,
}

impl HubConfig {
    pub fn new(base_api: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_api: base_api.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubConfig")
            .field("base_api", &self.base_api)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// GitHub HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String,
}

impl GitHubClient {
    /// Builds a client with auth headers baked into every request.
    pub fn new(cfg: HubConfig) -> HubResult<Self> {
        let base_api = cfg.base_api.trim().trim_end_matches('/').to_string();
        if !(base_api.starts_with("https://") || base_api.starts_with("http://")) {
            return Err(ConfigError::InvalidBaseUrl(cfg.base_api).into());
        }
        if cfg.token.trim().is_empty() {
            return Err(ConfigError::MissingToken.into());
        }
        debug!("Creating GitHubClient with base_api={}", base_api);

        let http = Client::builder()
            .user_agent(concat!("hub-comment/", env!("CARGO_PKG_VERSION")))
            .default_headers(build_headers(cfg.token.trim())?)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, base_api })
    }

    /// Fetches the user the token belongs to.
    pub async fn current_user(&self) -> HubResult<User> {
        let url = format!("{}/user", self.base_api);
        debug!("GitHub current_user: {}", url);
        decode(self.http.get(url).send().await?).await
    }

    /// Fetches issue metadata (title, labels) for the pull request.
    pub async fn get_issue(&self, pr: &PullRequestRef) -> HubResult<Issue> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.base_api, pr.owner, pr.repo, pr.number
        );
        debug!("GitHub get_issue: {}", url);
        decode(self.http.get(url).send().await?).await
    }

    /// Fetches every conversation comment on the pull request, following
    /// pagination, in the order the API returns them.
    pub async fn list_comments(&self, pr: &PullRequestRef) -> HubResult<Vec<IssueComment>> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_api, pr.owner, pr.repo, pr.number
        );

        let mut comments = Vec::new();
        for page in 1..=MAX_PAGES {
            debug!("GitHub list_comments: {} page={}", url, page);
            let batch: Vec<IssueComment> = decode(
                self.http
                    .get(&url)
                    .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                    .send()
                    .await?,
            )
            .await?;

            let short_page = batch.len() < PER_PAGE;
            comments.extend(batch);
            if short_page {
                return Ok(comments);
            }
        }

        warn!(
            pages = MAX_PAGES,
            fetched = comments.len(),
            "comment listing truncated at page limit"
        );
        Ok(comments)
    }

    /// Posts a new comment on the pull request.
    pub async fn create_comment(&self, pr: &PullRequestRef, body: &str) -> HubResult<IssueComment> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_api, pr.owner, pr.repo, pr.number
        );
        ensure_body(body)?;
        debug!("GitHub create_comment: {} bytes={}", url, body.len());
        decode(self.http.post(url).json(&CommentBody { body }).send().await?).await
    }

    /// Replaces the body of an existing comment.
    pub async fn update_comment(
        &self,
        pr: &PullRequestRef,
        comment_id: u64,
        body: &str,
    ) -> HubResult<IssueComment> {
        let url = format!(
            "{}/repos/{}/{}/issues/comments/{}",
            self.base_api, pr.owner, pr.repo, comment_id
        );
        if comment_id == 0 {
            return Err(HubError::Validation("comment id must be positive".into()));
        }
        ensure_body(body)?;
        debug!("GitHub update_comment: {} bytes={}", url, body.len());
        decode(self.http.patch(url).json(&CommentBody { body }).send().await?).await
    }
}

/// GitHub rejects blank comment bodies; fail before sending.
fn ensure_body(body: &str) -> HubResult<()> {
    if body.trim().is_empty() {
        return Err(HubError::Validation("comment body is empty".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

fn build_headers(token: &str) -> HubResult<HeaderMap> {
    let mut h = HeaderMap::new();
    h.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    h.insert(
        "X-GitHub-Api-Version",
        HeaderValue::from_static("2022-11-28"),
    );
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ConfigError::InvalidToken(e.to_string()))?;
    auth.set_sensitive(true);
    h.insert(AUTHORIZATION, auth);
    Ok(h)
}

/// Maps non-success statuses to errors and decodes the JSON body.
async fn decode<T: DeserializeOwned>(resp: Response) -> HubResult<T> {
    let status = resp.status();
    if !status.is_success() {
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = resp.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            body = %body.chars().take(200).collect::<String>(),
            "GitHub request failed"
        );
        return Err(ProviderError::from_status(status.as_u16(), retry_after).into());
    }

    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()).into())
}
