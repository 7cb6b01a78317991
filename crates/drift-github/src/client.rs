//! GitHub REST API client

use std::sync::atomic::{AtomicU32, Ordering};

use base64::Engine;
use futures_util::{StreamExt, stream};
use thiserror::Error;

use drift_core::model::{FileChange, FileStatus};

use crate::model::{CommitInfo, CompareFile, CompareResponse, ContentFile};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "drift-change-analyzer/0.1";

/// Client-side request budget per invocation.
const DEFAULT_REQUEST_BUDGET: u32 = 5000;

/// How many content fetches run concurrently per repository.
const CONTENT_FETCH_CONCURRENCY: usize = 8;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("GitHub token is required; set GITHUB_TOKEN or pass --token")]
    MissingToken,

    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    #[error("GitHub API authentication failed")]
    AuthFailed,

    #[error("GitHub API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// Authenticated GitHub REST client with a per-invocation request budget.
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    request_count: AtomicU32,
    request_budget: u32,
}

impl GitHubClient {
    /// Build a client from an explicit token or the `GITHUB_TOKEN`
    /// environment variable.
    pub fn new(token: Option<String>) -> Result<Self> {
        let token = token
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .ok_or(GitHubError::MissingToken)?;

        Ok(Self {
            client: reqwest::Client::new(),
            token,
            request_count: AtomicU32::new(0),
            request_budget: DEFAULT_REQUEST_BUDGET,
        })
    }

    pub fn with_request_budget(mut self, budget: u32) -> Self {
        self.request_budget = budget;
        self
    }

    async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<reqwest::Response> {
        let count = self.request_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count > self.request_budget {
            return Err(GitHubError::RateLimited);
        }

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GitHubError::AuthFailed);
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            if body.to_lowercase().contains("rate limit") {
                return Err(GitHubError::RateLimited);
            }
            return Err(GitHubError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Comparison between two refs.
    pub async fn compare(&self, repo: &str, base: &str, head: &str) -> Result<CompareResponse> {
        let url = format!("{API_BASE}/repos/{repo}/compare/{base}...{head}");
        Ok(self.get(&url, &[]).await?.json().await?)
    }

    /// File content and blob sha at a ref. `None` when the path does not
    /// exist at that ref, or names a directory.
    pub async fn file_content(
        &self,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<(String, String)>> {
        let url = format!("{API_BASE}/repos/{repo}/contents/{path}");
        let response = match self.get(&url, &[("ref", git_ref)]).await {
            Ok(response) => response,
            Err(GitHubError::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let value: serde_json::Value = response.json().await?;
        if value.is_array() {
            return Ok(None);
        }
        let file: ContentFile =
            serde_json::from_value(value).map_err(|e| GitHubError::Payload(e.to_string()))?;
        let text = decode_content(&file.content)?;
        Ok(Some((text, file.sha)))
    }

    /// Commits, newest first, optionally filtered by date range and path.
    pub async fn commits(
        &self,
        repo: &str,
        since: Option<&str>,
        until: Option<&str>,
        path: Option<&str>,
    ) -> Result<Vec<CommitInfo>> {
        let url = format!("{API_BASE}/repos/{repo}/commits");
        let mut params = Vec::new();
        if let Some(since) = since {
            params.push(("since", since));
        }
        if let Some(until) = until {
            params.push(("until", until));
        }
        if let Some(path) = path {
            params.push(("path", path));
        }
        Ok(self.get(&url, &params).await?.json().await?)
    }

    /// All changed Python files between two refs, with both sides fetched.
    ///
    /// Content fetches are pipelined with bounded concurrency, in listing
    /// order. A file whose content cannot be fetched is logged and skipped;
    /// it never aborts the rest of the listing.
    pub async fn changed_python_files(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<FileChange>> {
        let comparison = self.compare(repo, base, head).await?;

        let fetches = comparison
            .files
            .into_iter()
            .filter(|f| f.filename.ends_with(".py"))
            .map(|f| self.fetch_change(repo, base, head, f));
        let results: Vec<_> = stream::iter(fetches)
            .buffered(CONTENT_FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut changes = Vec::new();
        for result in results {
            match result {
                Ok(change) => changes.push(change),
                Err((path, err)) => {
                    tracing::warn!("could not fetch {}: {}", path, err);
                }
            }
        }
        Ok(changes)
    }

    async fn fetch_change(
        &self,
        repo: &str,
        base: &str,
        head: &str,
        file: CompareFile,
    ) -> std::result::Result<FileChange, (String, GitHubError)> {
        let status = parse_status(&file.status);

        let old = if status == FileStatus::Added {
            None
        } else {
            self.file_content(repo, &file.filename, base)
                .await
                .map_err(|e| (file.filename.clone(), e))?
        };
        let new = if status == FileStatus::Removed {
            None
        } else {
            self.file_content(repo, &file.filename, head)
                .await
                .map_err(|e| (file.filename.clone(), e))?
        };

        let (old_text, old_rev) = old.map(|(t, sha)| (Some(t), Some(sha))).unwrap_or_default();
        let (new_text, new_rev) = new.map(|(t, sha)| (Some(t), Some(sha))).unwrap_or_default();

        Ok(FileChange {
            path: file.filename,
            repo: repo.to_string(),
            old_text,
            new_text,
            status,
            old_rev,
            new_rev,
        })
    }
}

/// Map a compare-payload status string onto the modeled set. Statuses
/// without a modeled counterpart (renamed, copied, changed) fall back to
/// Modified; rename detection is out of scope.
pub fn parse_status(status: &str) -> FileStatus {
    match status {
        "added" => FileStatus::Added,
        "removed" => FileStatus::Removed,
        _ => FileStatus::Modified,
    }
}

/// Decode a contents-endpoint base64 payload, which arrives with embedded
/// newlines.
fn decode_content(payload: &str) -> Result<String> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GitHubError::Payload(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| GitHubError::Payload(format!("utf-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_with_embedded_newlines() {
        let payload = "ZGVmIGYoKTo\nKICAgIHBh\nc3MK";
        let text = decode_content(payload).unwrap();
        assert_eq!(text, "def f():\n    pass\n");
    }

    #[test]
    fn rejects_garbage_content() {
        assert!(decode_content("!!!not base64!!!").is_err());
    }

    #[test]
    fn status_strings_map_onto_the_modeled_set() {
        assert_eq!(parse_status("added"), FileStatus::Added);
        assert_eq!(parse_status("removed"), FileStatus::Removed);
        assert_eq!(parse_status("modified"), FileStatus::Modified);
        assert_eq!(parse_status("renamed"), FileStatus::Modified);
    }

    #[test]
    fn compare_payload_deserializes() {
        let json = r#"{
            "files": [
                {"filename": "src/app.py", "status": "modified", "additions": 3},
                {"filename": "README.md", "status": "modified"}
            ]
        }"#;
        let compare: CompareResponse = serde_json::from_str(json).unwrap();
        assert_eq!(compare.files.len(), 2);
        assert_eq!(compare.files[0].filename, "src/app.py");
    }

    #[test]
    fn commits_payload_deserializes() {
        let json = r#"[
            {
                "sha": "abc123def456789",
                "commit": {
                    "message": "Add optional third parameter\n\nDetails here.",
                    "author": {
                        "name": "John Doe",
                        "email": "john@example.com",
                        "date": "2024-01-15T10:30:00Z"
                    }
                }
            }
        ]"#;
        let commits: Vec<CommitInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(commits[0].sha, "abc123def456789");
        assert_eq!(commits[0].subject(), "Add optional third parameter");
    }
}
