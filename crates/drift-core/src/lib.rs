//! Drift Core — change data model, definition matching, line diffing,
//! annotation, and report aggregation

pub mod aggregate;
pub mod annotate;
pub mod diff;
pub mod error;
pub mod matcher;
pub mod model;


pub use aggregate::{RepoTotals, RunTotals};
pub use annotate::{annotate, render, strip_markers};
pub use diff::{diff_lines, render_unified};
pub use error::{CoreError, Result};
pub use matcher::{match_and_diff, match_definitions};
pub use model::{
    AnalysisFailure, AnnotatedFile, AnnotatedLine, AnnotationStyle, ChangeRecord, ChangeSummary,
    Classification, Definition, DefinitionKind, EditOp, FileAnalysis, FileChange, FileStatus,
    LineEdit, LineMarker, Side,
};
