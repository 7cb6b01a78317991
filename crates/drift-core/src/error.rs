//! Error types for the analysis core

use thiserror::Error;

/// Errors surfaced by the analysis core. All of these are recoverable at
/// file granularity; sibling files keep processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unknown annotation style '{0}' (expected comment, inline, or markup)")]
    UnknownStyle(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
