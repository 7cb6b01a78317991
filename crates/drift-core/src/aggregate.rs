//! Per-repository and cross-repository change totals

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ChangeSummary, Classification, FileAnalysis};

/// Rolled-up counts for one repository. Pure accumulation; no
/// classification logic of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTotals {
    pub files_changed: usize,
    pub defs_added: usize,
    pub defs_removed: usize,
    pub defs_modified: usize,
    pub lines_added: usize,
    pub lines_changed: usize,
    pub lines_removed: usize,
    /// Files whose definition-level analysis was skipped by a parse error.
    /// They still count in `files_changed`.
    pub parse_failures: usize,
}

impl RepoTotals {
    /// Fold one file's analysis into the totals. Line counts come from the
    /// annotated sides: additions from the new side, removals from the old
    /// side, and changed lines from whichever side exists (the paired count
    /// is identical on both).
    pub fn record_file(
        &mut self,
        analysis: &FileAnalysis,
        old_summary: Option<&ChangeSummary>,
        new_summary: Option<&ChangeSummary>,
    ) {
        self.files_changed += 1;
        if analysis.failure.is_some() {
            self.parse_failures += 1;
            return;
        }

        for record in analysis.changed_records() {
            match record.classification {
                Classification::Added => self.defs_added += 1,
                Classification::Removed => self.defs_removed += 1,
                Classification::Modified => self.defs_modified += 1,
                Classification::Unchanged => {}
            }
        }

        if let Some(new) = new_summary {
            self.lines_added += new.lines_added;
        }
        if let Some(old) = old_summary {
            self.lines_removed += old.lines_removed;
        }
        if let Some(summary) = new_summary.or(old_summary) {
            self.lines_changed += summary.lines_changed;
        }
    }

    pub fn merge(&mut self, other: &RepoTotals) {
        self.files_changed += other.files_changed;
        self.defs_added += other.defs_added;
        self.defs_removed += other.defs_removed;
        self.defs_modified += other.defs_modified;
        self.lines_added += other.lines_added;
        self.lines_changed += other.lines_changed;
        self.lines_removed += other.lines_removed;
        self.parse_failures += other.parse_failures;
    }

    pub fn definitions_changed(&self) -> usize {
        self.defs_added + self.defs_removed + self.defs_modified
    }
}

/// Totals for one run, keyed by repository. Owned by the single reducer
/// step; analysis workers never touch it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunTotals {
    pub repos: BTreeMap<String, RepoTotals>,
}

impl RunTotals {
    pub fn record_file(
        &mut self,
        analysis: &FileAnalysis,
        old_summary: Option<&ChangeSummary>,
        new_summary: Option<&ChangeSummary>,
    ) {
        self.repos
            .entry(analysis.repo.clone())
            .or_default()
            .record_file(analysis, old_summary, new_summary);
    }

    pub fn repo_count(&self) -> usize {
        self.repos.len()
    }

    /// Totals across every repository in the run.
    pub fn overall(&self) -> RepoTotals {
        let mut overall = RepoTotals::default();
        for totals in self.repos.values() {
            overall.merge(totals);
        }
        overall
    }
}
