//! Core data structures for change analysis

use serde::{Deserialize, Serialize};

/// Discriminates what kind of source region a definition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Function,
    AsyncFunction,
    Class,
}

impl DefinitionKind {
    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            DefinitionKind::Function => "function",
            DefinitionKind::AsyncFunction => "async function",
            DefinitionKind::Class => "class",
        }
    }
}

/// A named function/async-function/class region of source text.
///
/// Line numbers are 0-based and inclusive, relative to the file version the
/// definition was extracted from. `body_text` is the verbatim source slice
/// covering `start_line..=end_line`, never a re-serialization, so it always
/// splits into exactly `end_line - start_line + 1` lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub start_line: usize,
    pub end_line: usize,
    pub body_text: String,
    /// Decorator expressions in source order, without the leading `@`.
    pub decorators: Vec<String>,
    pub docstring: Option<String>,
}

impl Definition {
    /// Number of source lines this definition spans.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    pub fn body_lines(&self) -> Vec<&str> {
        self.body_text.split('\n').collect()
    }
}

/// File-level status reported by the version-control collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
        }
    }
}

/// One changed file between two refs. Either side may be absent for
/// created/deleted files; revision ids are carried through for reporting
/// only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub repo: String,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
    pub status: FileStatus,
    pub old_rev: Option<String>,
    pub new_rev: Option<String>,
}

/// How one named definition changed between two file versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// Classification of one named definition between two file versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub name: String,
    pub kind: DefinitionKind,
    pub old: Option<Definition>,
    pub new: Option<Definition>,
    pub classification: Classification,
    /// Line-level alignment of the two bodies, populated only for Modified
    /// records.
    pub edits: Vec<LineEdit>,
}

/// Alignment operation for one line of a modified definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditOp {
    Equal,
    Insert,
    Delete,
}

/// One aligned unit in a line-level diff. Line indices are 0-based within
/// the definition body on the respective side.
///
/// The Equal+Delete subsequence reproduces the old body exactly; the
/// Equal+Insert subsequence reproduces the new body exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEdit {
    pub op: EditOp,
    pub old_line: Option<usize>,
    pub new_line: Option<usize>,
    pub text: String,
}

/// Which side of a file pair an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Old,
    New,
}

/// Per-line annotation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineMarker {
    None,
    Changed,
    Added,
    Removed,
}

/// A single source line paired with its change marker. `text` is always the
/// verbatim source line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedLine {
    pub text: String,
    pub marker: LineMarker,
}

/// Line counts for one annotated side of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub lines_changed: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
    pub lines_unchanged: usize,
}

/// A full file's lines paired with per-line markers, plus the metadata the
/// rendered header block carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedFile {
    pub lines: Vec<AnnotatedLine>,
    pub summary: ChangeSummary,
    pub repo: String,
    pub path: String,
    pub status: FileStatus,
    pub old_rev: Option<String>,
    pub new_rev: Option<String>,
}

/// Rendering strategy for annotated files. A closed set: unknown style
/// names are rejected at the boundary, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStyle {
    Comment,
    Inline,
    Markup,
}

impl std::str::FromStr for AnnotationStyle {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(AnnotationStyle::Comment),
            "inline" => Ok(AnnotationStyle::Inline),
            "markup" => Ok(AnnotationStyle::Markup),
            other => Err(crate::error::CoreError::UnknownStyle(other.to_string())),
        }
    }
}

/// Structured record of a side that failed to parse. The file still counts
/// as a file-level change; only definition-level detail is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub side: Side,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl AnalysisFailure {
    pub fn new(side: Side, err: &crate::error::CoreError) -> Self {
        match err {
            crate::error::CoreError::Parse {
                line,
                column,
                message,
            } => AnalysisFailure {
                side,
                line: *line,
                column: *column,
                message: message.clone(),
            },
            other => AnalysisFailure {
                side,
                line: 0,
                column: 0,
                message: other.to_string(),
            },
        }
    }
}

/// Result of one file pair's analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: String,
    pub repo: String,
    pub status: FileStatus,
    pub old_rev: Option<String>,
    pub new_rev: Option<String>,
    /// Every union member, Unchanged included; callers filter.
    pub records: Vec<ChangeRecord>,
    pub failure: Option<AnalysisFailure>,
}

impl FileAnalysis {
    /// Records excluding Unchanged ones.
    pub fn changed_records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records
            .iter()
            .filter(|r| r.classification != Classification::Unchanged)
    }

    pub fn has_changes(&self) -> bool {
        self.changed_records().next().is_some()
    }
}
