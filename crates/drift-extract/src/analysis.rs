//! Per-file analysis pipeline: extract, match, diff

use drift_core::error::CoreError;
use drift_core::matcher::match_and_diff;
use drift_core::model::{AnalysisFailure, Definition, FileAnalysis, FileChange, Side};

use crate::extractor::PythonExtractor;
use crate::parser_pool::create_parser_pool;

/// Runs the structural pipeline for one changed file at a time. Holds no
/// per-file state, so one analyzer can serve a whole worker pool.
pub struct Analyzer {
    extractor: PythonExtractor,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            extractor: PythonExtractor::new(create_parser_pool()),
        }
    }

    /// Extract both sides, pair definitions by name, and diff the modified
    /// pairs.
    ///
    /// A side that fails to parse degrades the file to a file-level change:
    /// the result carries the failure and no definition records, and
    /// sibling files are unaffected. An absent side is modeled state, not
    /// an error.
    pub fn analyze(&self, change: &FileChange) -> FileAnalysis {
        let old_defs = match self.extract_side(change, Side::Old) {
            Ok(defs) => defs,
            Err(failure) => return self.file_level_only(change, failure),
        };
        let new_defs = match self.extract_side(change, Side::New) {
            Ok(defs) => defs,
            Err(failure) => return self.file_level_only(change, failure),
        };

        let records = match_and_diff(&old_defs, &new_defs).into_values().collect();
        FileAnalysis {
            path: change.path.clone(),
            repo: change.repo.clone(),
            status: change.status,
            old_rev: change.old_rev.clone(),
            new_rev: change.new_rev.clone(),
            records,
            failure: None,
        }
    }

    fn extract_side(
        &self,
        change: &FileChange,
        side: Side,
    ) -> Result<Vec<Definition>, AnalysisFailure> {
        let text = match side {
            Side::Old => change.old_text.as_deref(),
            Side::New => change.new_text.as_deref(),
        };
        match text {
            None => Ok(Vec::new()),
            Some(text) => self
                .extractor
                .extract(text)
                .map_err(|err: CoreError| AnalysisFailure::new(side, &err)),
        }
    }

    fn file_level_only(&self, change: &FileChange, failure: AnalysisFailure) -> FileAnalysis {
        tracing::warn!(
            "skipping definition analysis for {}: {} (line {}, column {})",
            change.path,
            failure.message,
            failure.line,
            failure.column
        );
        FileAnalysis {
            path: change.path.clone(),
            repo: change.repo.clone(),
            status: change.status,
            old_rev: change.old_rev.clone(),
            new_rev: change.new_rev.clone(),
            records: Vec::new(),
            failure: Some(failure),
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
