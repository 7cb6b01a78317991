//! CLI command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;

use drift_core::aggregate::RunTotals;
use drift_core::annotate::annotate;
use drift_core::model::{AnnotationStyle, ChangeSummary, FileAnalysis, FileChange, Side};
use drift_extract::Analyzer;
use drift_github::{CommitInfo, GitHubClient};
use drift_report::{CommitNote, ReportWriter};

/// How many recent commits to cite in diff-file headers.
const DIFF_HEADER_COMMITS: usize = 5;

/// Resolved run settings: CLI flags over drift.toml over defaults.
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub style: AnnotationStyle,
    pub token: Option<String>,
    pub request_budget: Option<u32>,
    pub save_files: bool,
    pub save_diffs: bool,
}

/// Analyze each repository between two refs and write the full report set.
pub async fn compare(
    repos: Vec<String>,
    base: String,
    head: String,
    opts: RunOptions,
) -> Result<()> {
    let repos = validate_repositories(&repos);
    if repos.is_empty() {
        anyhow::bail!("no valid repositories given; expected owner/repo");
    }

    let client = build_client(&opts)?;
    let writer = ReportWriter::new(&opts.output_dir, opts.style)?;
    let subdir = format!("file_versions_{base}_{head}");

    let mut totals = RunTotals::default();
    let mut all_analyses = Vec::new();

    for repo in &repos {
        tracing::info!("Analyzing repository: {}", repo);
        let changes = match client.changed_python_files(repo, &base, &head).await {
            Ok(changes) => changes,
            Err(e) => {
                // One failing repository never aborts the rest of the run.
                tracing::error!("error analyzing {}: {}", repo, e);
                continue;
            }
        };
        tracing::info!("{}: {} changed Python files", repo, changes.len());

        let commits = if opts.save_diffs {
            recent_commits(&client, repo).await
        } else {
            Vec::new()
        };

        let analyses = analyze_files(changes.clone()).await?;

        // Single reducer step: analysis workers never touch the totals.
        for (change, analysis) in changes.iter().zip(&analyses) {
            let (old_summary, new_summary) = side_summaries(change, analysis);
            totals.record_file(analysis, old_summary.as_ref(), new_summary.as_ref());

            if opts.save_files {
                writer.save_file_versions(change, analysis, &subdir, true)?;
            }
            if opts.save_diffs && analysis.has_changes() {
                writer.save_definition_diffs(change, analysis, &subdir, &commits)?;
            }
        }
        all_analyses.extend(analyses);
    }

    let report_path =
        writer.write_comprehensive_report(&all_analyses, &totals, "comprehensive_report.txt")?;
    tracing::info!("Comprehensive report saved to {}", report_path.display());

    print_summary(&totals);
    Ok(())
}

/// Walk the last `days` of commits pairwise and analyze each adjacent pair.
pub async fn history(repo: String, days: i64, opts: RunOptions) -> Result<()> {
    if validate_repositories(std::slice::from_ref(&repo)).is_empty() {
        anyhow::bail!("invalid repository '{repo}'; expected owner/repo");
    }

    let client = build_client(&opts)?;
    let writer = ReportWriter::new(&opts.output_dir, opts.style)?;

    let since = (chrono::Utc::now() - chrono::Duration::days(days)).to_rfc3339();
    let commits = client.commits(&repo, Some(&since), None, None).await?;
    if commits.len() < 2 {
        tracing::info!("no commit ranges to analyze in the last {} days", days);
        return Ok(());
    }
    tracing::info!("{}: analyzing {} commit ranges", repo, commits.len() - 1);

    let mut totals = RunTotals::default();
    let mut all_analyses = Vec::new();

    for window in commits.windows(2) {
        let head = &window[0].sha;
        let base = &window[1].sha;
        let changes = match client.changed_python_files(&repo, base, head).await {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!("skipping range {}..{}: {}", base, head, e);
                continue;
            }
        };

        let analyses = analyze_files(changes.clone()).await?;
        for (change, analysis) in changes.iter().zip(&analyses) {
            let (old_summary, new_summary) = side_summaries(change, analysis);
            totals.record_file(analysis, old_summary.as_ref(), new_summary.as_ref());
        }
        all_analyses.extend(analyses);
    }

    let filename = format!("history_analysis_{days}days.txt");
    let report_path = writer.write_comprehensive_report(&all_analyses, &totals, &filename)?;
    tracing::info!("History report saved to {}", report_path.display());

    print_summary(&totals);
    Ok(())
}

fn build_client(opts: &RunOptions) -> Result<GitHubClient> {
    let mut client = GitHubClient::new(opts.token.clone())?;
    if let Some(budget) = opts.request_budget {
        client = client.with_request_budget(budget);
    }
    Ok(client)
}

/// Fan the per-file pipeline out across the rayon pool. Each file is
/// analyzed independently; results come back in input order for the
/// reducer.
async fn analyze_files(changes: Vec<FileChange>) -> Result<Vec<FileAnalysis>> {
    tokio::task::spawn_blocking(move || {
        let analyzer = Analyzer::new();
        changes
            .par_iter()
            .map(|change| analyzer.analyze(change))
            .collect()
    })
    .await
    .context("analysis workers panicked")
}

fn side_summaries(
    change: &FileChange,
    analysis: &FileAnalysis,
) -> (Option<ChangeSummary>, Option<ChangeSummary>) {
    let old = change
        .old_text
        .as_deref()
        .map(|text| annotate(analysis, text, Side::Old).summary);
    let new = change
        .new_text
        .as_deref()
        .map(|text| annotate(analysis, text, Side::New).summary);
    (old, new)
}

async fn recent_commits(client: &GitHubClient, repo: &str) -> Vec<CommitNote> {
    match client.commits(repo, None, None, None).await {
        Ok(commits) => commits
            .iter()
            .take(DIFF_HEADER_COMMITS)
            .map(commit_note)
            .collect(),
        Err(e) => {
            tracing::warn!("could not list commits for {}: {}", repo, e);
            Vec::new()
        }
    }
}

fn commit_note(info: &CommitInfo) -> CommitNote {
    CommitNote {
        sha: info.sha.clone(),
        author: info.commit.author.as_ref().map(|a| a.name.clone()),
        date: info.commit.author.as_ref().map(|a| a.date.clone()),
        subject: info.subject().to_string(),
    }
}

fn validate_repositories(repos: &[String]) -> Vec<String> {
    let mut valid = Vec::new();
    for repo in repos {
        if repo.contains('/') {
            valid.push(repo.clone());
        } else {
            tracing::warn!("invalid repository format '{}'; expected owner/repo", repo);
        }
    }
    valid
}

fn print_summary(totals: &RunTotals) {
    let overall = totals.overall();
    println!("\nAnalysis Summary:");
    println!("Repositories analyzed: {}", totals.repo_count());
    println!("Total Python files changed: {}", overall.files_changed);
    println!(
        "Total definitions changed: {}",
        overall.definitions_changed()
    );
    println!(
        "Lines added: {}, changed: {}, removed: {}",
        overall.lines_added, overall.lines_changed, overall.lines_removed
    );
    if overall.parse_failures > 0 {
        println!("Files skipped (parse errors): {}", overall.parse_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_names_require_an_owner() {
        let repos = vec![
            "owner/repo".to_string(),
            "bare-name".to_string(),
            "a/b".to_string(),
        ];
        assert_eq!(validate_repositories(&repos), vec!["owner/repo", "a/b"]);
    }
}
