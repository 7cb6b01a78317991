//! End-to-end pipeline tests over in-memory file pairs
//!
//! No network: file pairs are fed straight into the analysis pipeline and
//! the results are checked through annotation, aggregation, and report
//! writing.

use std::fs;

use drift_core::aggregate::RunTotals;
use drift_core::annotate::{annotate, render, strip_markers};
use drift_core::model::{
    AnnotationStyle, Classification, FileChange, FileStatus, LineMarker, Side,
};
use drift_extract::Analyzer;
use drift_report::ReportWriter;

const OLD_MODULE: &str = r#"#!/usr/bin/env python3
"""Example module"""

import os

class Calculator:
    """A simple calculator class"""

    def __init__(self):
        self.history = []

    def add(self, a, b):
        """Add two numbers"""
        result = a + b
        self.history.append(result)
        return result

    def old_method(self):
        """This method will be removed"""
        return None

def helper_function():
    """A helper function"""
    return "helper"

VERSION = "1.0.0"
"#;

const NEW_MODULE: &str = r#"#!/usr/bin/env python3
"""Example module"""

import os

class Calculator:
    """A simple calculator class"""

    def __init__(self, precision=2):
        self.history = []
        self.precision = precision

    def add(self, a, b):
        """Add two numbers"""
        result = round(a + b, self.precision)
        self.history.append(result)
        return result

    def multiply(self, a, b):
        """Multiply two numbers"""
        result = round(a * b, self.precision)
        self.history.append(result)
        return result

def helper_function():
    """A helper function"""
    return "helper"

VERSION = "2.0.0"
"#;

fn calculator_change() -> FileChange {
    FileChange {
        path: "calculator.py".to_string(),
        repo: "demo/example".to_string(),
        old_text: Some(OLD_MODULE.to_string()),
        new_text: Some(NEW_MODULE.to_string()),
        status: FileStatus::Modified,
        old_rev: Some("abc123".to_string()),
        new_rev: Some("def456".to_string()),
    }
}

#[test]
fn pipeline_classifies_the_calculator_module() {
    let analysis = Analyzer::new().analyze(&calculator_change());
    assert!(analysis.failure.is_none());

    let classification_of = |name: &str| {
        analysis
            .records
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no record for {name}"))
            .classification
    };

    assert_eq!(classification_of("Calculator"), Classification::Modified);
    assert_eq!(classification_of("__init__"), Classification::Modified);
    assert_eq!(classification_of("add"), Classification::Modified);
    assert_eq!(classification_of("multiply"), Classification::Added);
    assert_eq!(classification_of("old_method"), Classification::Removed);
    assert_eq!(
        classification_of("helper_function"),
        Classification::Unchanged
    );

    let changed: Vec<&str> = analysis
        .changed_records()
        .map(|r| r.name.as_str())
        .collect();
    assert!(!changed.contains(&"helper_function"));
}

#[test]
fn annotation_round_trips_for_every_style_on_both_sides() {
    let change = calculator_change();
    let analysis = Analyzer::new().analyze(&change);

    for (text, side) in [(OLD_MODULE, Side::Old), (NEW_MODULE, Side::New)] {
        let annotated = annotate(&analysis, text, side);
        assert_eq!(annotated.lines.len(), text.split('\n').count());
        assert_eq!(strip_markers(&annotated), text);

        for style in [
            AnnotationStyle::Comment,
            AnnotationStyle::Inline,
            AnnotationStyle::Markup,
        ] {
            let rendered = render(&annotated, style);
            assert!(rendered.contains("demo/example"));
        }
    }
}

#[test]
fn markers_land_on_the_expected_regions() {
    let change = calculator_change();
    let analysis = Analyzer::new().analyze(&change);

    let old_side = annotate(&analysis, OLD_MODULE, Side::Old);
    let old_lines: Vec<&str> = OLD_MODULE.split('\n').collect();

    // Removed method lines carry Removed on the old side.
    let removed_start = old_lines
        .iter()
        .position(|l| l.contains("def old_method"))
        .unwrap();
    assert_eq!(old_side.lines[removed_start].marker, LineMarker::Removed);

    // Top-level code outside any definition stays unmarked.
    let version_line = old_lines
        .iter()
        .position(|l| l.starts_with("VERSION"))
        .unwrap();
    assert_eq!(old_side.lines[version_line].marker, LineMarker::None);

    let new_side = annotate(&analysis, NEW_MODULE, Side::New);
    let new_lines: Vec<&str> = NEW_MODULE.split('\n').collect();

    // Added method lines carry a marker on the new side (Added, or Changed
    // where the class-body alignment pairs them against removed lines).
    let added_start = new_lines
        .iter()
        .position(|l| l.contains("def multiply"))
        .unwrap();
    assert_ne!(new_side.lines[added_start].marker, LineMarker::None);

    // The unchanged helper stays unmarked on both sides.
    let helper_line = new_lines
        .iter()
        .position(|l| l.contains("def helper_function"))
        .unwrap();
    assert_eq!(new_side.lines[helper_line].marker, LineMarker::None);
}

#[test]
fn parse_failure_in_one_file_never_aborts_siblings() {
    let analyzer = Analyzer::new();
    let broken = FileChange {
        path: "broken.py".to_string(),
        repo: "demo/example".to_string(),
        old_text: Some("def fine():\n    return 1\n".to_string()),
        new_text: Some("def broken(:\n    pass\n".to_string()),
        status: FileStatus::Modified,
        old_rev: None,
        new_rev: None,
    };

    let analyses = vec![
        analyzer.analyze(&broken),
        analyzer.analyze(&calculator_change()),
    ];

    assert!(analyses[0].failure.is_some());
    assert!(analyses[0].records.is_empty());
    assert!(analyses[1].failure.is_none());
    assert!(analyses[1].has_changes());

    let mut totals = RunTotals::default();
    for analysis in &analyses {
        totals.record_file(analysis, None, None);
    }
    let overall = totals.overall();
    assert_eq!(overall.files_changed, 2);
    assert_eq!(overall.parse_failures, 1);
}

#[test]
fn reports_are_written_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ReportWriter::new(dir.path(), AnnotationStyle::Comment).unwrap();

    let change = calculator_change();
    let analysis = Analyzer::new().analyze(&change);

    let old_summary = annotate(&analysis, OLD_MODULE, Side::Old).summary;
    let new_summary = annotate(&analysis, NEW_MODULE, Side::New).summary;
    let mut totals = RunTotals::default();
    totals.record_file(&analysis, Some(&old_summary), Some(&new_summary));

    let saved = writer
        .save_file_versions(&change, &analysis, "file_versions", true)
        .unwrap();
    assert_eq!(fs::read_to_string(saved.old.unwrap()).unwrap(), OLD_MODULE);
    assert_eq!(fs::read_to_string(saved.new.unwrap()).unwrap(), NEW_MODULE);

    let report_path = writer
        .write_comprehensive_report(
            std::slice::from_ref(&analysis),
            &totals,
            "comprehensive_report.txt",
        )
        .unwrap();
    let report = fs::read_to_string(report_path).unwrap();
    assert!(report.contains("Repository: demo/example"));
    assert!(report.contains("CLASS: Calculator"));
    assert!(report.contains("STATUS: ADDED"));
    assert!(report.contains("STATUS: REMOVED"));
}
