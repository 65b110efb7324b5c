//! Pull request comment renderer and GitHub upsert.
//!
//! The comment carries a hidden marker so reruns on the same PR edit the
//! existing comment instead of stacking new ones. Posting requires
//! `GITHUB_TOKEN`, `GITHUB_REPOSITORY` (`owner/repo`) and `PR_NUMBER`;
//! without them the body is printed to stdout.

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    COMMENT_MARKER, ENV_GITHUB_API_URL, ENV_GITHUB_REPOSITORY, ENV_GITHUB_TOKEN, ENV_PR_NUMBER,
    GITHUB_API_URL,
};
use crate::env::Env;
use crate::models::DiffResult;
use crate::output::OutputRenderer;

/// Comments fetched per page when looking for an existing marker.
const PAGE_SIZE: usize = 100;

/// Errors from GitHub API calls.
#[derive(Error, Debug)]
pub enum CommentError {
    #[error("invalid PR_NUMBER {0:?}")]
    InvalidPrNumber(String),

    #[error("invalid GITHUB_REPOSITORY {0:?}: expected owner/repo")]
    InvalidRepository(String),

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{action} failed with HTTP {status}: {body}")]
    Api {
        action: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// PR comment markdown renderer.
pub struct CommentRenderer {
    pub head_sha: String,
    pub base_sha: String,
}

impl OutputRenderer for CommentRenderer {
    fn render(&self, result: &DiffResult) -> String {
        let mut md = format!("{COMMENT_MARKER}\n### Kustomize Render Diff\n\n");
        md.push_str(&format!(
            "Comparing `{}` → `{}`\n\n",
            self.base_sha, self.head_sha
        ));

        if result.is_empty() {
            md.push_str("No render differences detected.\n");
            return md;
        }

        md.push_str("| Component | Environment | Changes |\n");
        md.push_str("|-----------|-------------|---------|\n");
        for d in &result.sorted().diffs {
            if d.is_error() {
                md.push_str(&format!("| `{}` | {} | build error |\n", d.path, d.env));
            } else {
                md.push_str(&format!(
                    "| `{}` | {} | +{} -{} |\n",
                    d.path, d.env, d.added, d.removed
                ));
            }
        }
        md.push('\n');
        md.push_str(&format!(
            "**Total:** {} components, +{} -{} lines\n\n",
            result.len(),
            result.total_added,
            result.total_removed
        ));
        md.push_str(
            "📋 Full diff available in the [workflow summary](../actions) and as a downloadable artifact.\n",
        );
        md
    }
}

/// Where to post: a pull request on GitHub.
#[derive(Clone)]
pub struct GitHubTarget {
    pub api_url: String,
    pub token: String,
    pub repository: String,
    pub pr_number: u64,
}

impl std::fmt::Debug for GitHubTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubTarget")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .field("repository", &self.repository)
            .field("pr_number", &self.pr_number)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

impl GitHubTarget {
    /// Read the target from the environment.
    ///
    /// Returns `Ok(None)` when any required variable is missing, so the
    /// caller can fall back to printing.
    pub fn from_env(env: &Env) -> Result<Option<Self>, CommentError> {
        let (Some(token), Some(repository), Some(pr)) = (
            env.non_empty(ENV_GITHUB_TOKEN),
            env.non_empty(ENV_GITHUB_REPOSITORY),
            env.non_empty(ENV_PR_NUMBER),
        ) else {
            return Ok(None);
        };

        let pr_number = match pr.parse::<u64>() {
            Ok(n) if n > 0 => n,
            _ => return Err(CommentError::InvalidPrNumber(pr)),
        };
        if repository.split('/').filter(|s| !s.is_empty()).count() != 2 {
            return Err(CommentError::InvalidRepository(repository));
        }

        let api_url = env
            .non_empty(ENV_GITHUB_API_URL)
            .unwrap_or_else(|| GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Some(Self {
            api_url,
            token,
            repository,
            pr_number,
        }))
    }

    fn request(
        &self,
        client: &reqwest::Client,
        method: reqwest::Method,
        url: &str,
    ) -> reqwest::RequestBuilder {
        client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header(
                "User-Agent",
                format!("{}/{}", crate::constants::APP_NAME, crate::constants::VERSION),
            )
    }

    /// Find our previous comment on the PR, if any.
    async fn find_existing(&self, client: &reqwest::Client) -> Result<Option<u64>, CommentError> {
        for page in 1.. {
            let url = format!(
                "{}/repos/{}/issues/{}/comments?per_page={PAGE_SIZE}&page={page}",
                self.api_url, self.repository, self.pr_number
            );
            let response = self
                .request(client, reqwest::Method::GET, &url)
                .send()
                .await?;
            let response = check(response, "listing comments").await?;
            let comments: Vec<IssueComment> = response.json().await?;

            if let Some(existing) = comments.iter().find(|c| {
                c.body
                    .as_deref()
                    .is_some_and(|b| b.contains(COMMENT_MARKER))
            }) {
                return Ok(Some(existing.id));
            }
            if comments.len() < PAGE_SIZE {
                break;
            }
        }
        Ok(None)
    }

    /// Edit our existing comment, or create one.
    pub async fn upsert_comment(&self, body: &str) -> Result<(), CommentError> {
        let client = reqwest::Client::new();
        let payload = serde_json::json!({ "body": body });

        match self.find_existing(&client).await? {
            Some(id) => {
                let url = format!(
                    "{}/repos/{}/issues/comments/{id}",
                    self.api_url, self.repository
                );
                let response = self
                    .request(&client, reqwest::Method::PATCH, &url)
                    .json(&payload)
                    .send()
                    .await?;
                check(response, "updating comment").await?;
                tracing::info!(pr = self.pr_number, comment = id, "updated PR comment");
            }
            None => {
                let url = format!(
                    "{}/repos/{}/issues/{}/comments",
                    self.api_url, self.repository, self.pr_number
                );
                let response = self
                    .request(&client, reqwest::Method::POST, &url)
                    .json(&payload)
                    .send()
                    .await?;
                check(response, "creating comment").await?;
                tracing::info!(pr = self.pr_number, "posted PR comment");
            }
        }
        Ok(())
    }
}

async fn check(
    response: reqwest::Response,
    action: &'static str,
) -> Result<reqwest::Response, CommentError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(CommentError::Api {
        action,
        status,
        body,
    })
}

/// Render the comment and post it when a GitHub target is configured,
/// otherwise print it to stdout.
pub async fn post_comment(
    result: &DiffResult,
    head_sha: &str,
    base_sha: &str,
    env: &Env,
) -> Result<(), CommentError> {
    let body = CommentRenderer {
        head_sha: head_sha.to_string(),
        base_sha: base_sha.to_string(),
    }
    .render(result);

    match GitHubTarget::from_env(env)? {
        Some(target) => target.upsert_comment(&body).await,
        None => {
            print!("{body}");
            Ok(())
        }
    }
}
