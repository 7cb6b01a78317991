//! On-disk report writing for analysis results

pub mod writer;

pub use writer::{CommitNote, ReportWriter, SavedVersions};
