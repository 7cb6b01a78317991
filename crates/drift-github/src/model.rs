//! Serde models for the GitHub REST payloads drift consumes

use serde::Deserialize;

/// Response of the compare endpoint, reduced to the file list.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareResponse {
    #[serde(default)]
    pub files: Vec<CompareFile>,
}

/// One entry of a compare payload's `files` array.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareFile {
    pub filename: String,
    pub status: String,
}

/// A file payload from the contents endpoint. Directory listings
/// deserialize as an array instead and are handled before this type.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFile {
    pub content: String,
    pub sha: String,
}

/// One entry of the commits listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub date: String,
}

impl CommitInfo {
    /// First line of the commit message.
    pub fn subject(&self) -> &str {
        self.commit.message.lines().next().unwrap_or_default()
    }
}
