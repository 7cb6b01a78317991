//! GitHub REST collaborator: compare, file contents, and commit listings

pub mod client;
pub mod model;

pub use client::{GitHubClient, GitHubError, parse_status};
pub use model::{CommitAuthor, CommitDetail, CommitInfo, CompareFile, CompareResponse};
