//! On-disk report writing: file versions, annotated renderings,
//! per-definition diffs, and the comprehensive cross-repo report

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use drift_core::aggregate::RunTotals;
use drift_core::annotate::{annotate, render};
use drift_core::diff::{diff_lines, render_unified};
use drift_core::model::{
    AnnotationStyle, ChangeRecord, Classification, Definition, FileAnalysis, FileChange, Side,
};

/// Commit metadata rendered into diff-file headers. Decoupled from the
/// fetch collaborator's payload types.
#[derive(Debug, Clone)]
pub struct CommitNote {
    pub sha: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub subject: String,
}

/// Paths written by `save_file_versions`.
#[derive(Debug, Clone, Default)]
pub struct SavedVersions {
    pub old: Option<PathBuf>,
    pub new: Option<PathBuf>,
    pub old_annotated: Option<PathBuf>,
    pub new_annotated: Option<PathBuf>,
}

/// Writes analysis output beneath a single output directory.
pub struct ReportWriter {
    output_dir: PathBuf,
    style: AnnotationStyle,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, style: AnnotationStyle) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        Ok(Self { output_dir, style })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn repo_dir(&self, subdir: &str, repo: &str) -> PathBuf {
        self.output_dir.join(subdir).join(repo.replace('/', "_"))
    }

    /// Write raw and (optionally) annotated versions of both sides of a
    /// changed file.
    pub fn save_file_versions(
        &self,
        change: &FileChange,
        analysis: &FileAnalysis,
        subdir: &str,
        save_annotated: bool,
    ) -> Result<SavedVersions> {
        let dir = self.repo_dir(subdir, &change.repo);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;

        let (stem, ext) = stem_and_extension(&change.path);
        let mut saved = SavedVersions::default();

        for (text, side) in [
            (change.old_text.as_deref(), Side::Old),
            (change.new_text.as_deref(), Side::New),
        ] {
            let Some(text) = text else {
                continue;
            };
            let side_name = match side {
                Side::Old => "old",
                Side::New => "new",
            };

            let raw_path = dir.join(format!("{stem}_{side_name}.{ext}"));
            fs::write(&raw_path, text)
                .with_context(|| format!("writing {}", raw_path.display()))?;

            let annotated_path = if save_annotated {
                let rendered = render(&annotate(analysis, text, side), self.style);
                let path = dir.join(format!(
                    "{stem}_{side_name}_annotated.{}",
                    style_extension(self.style, &ext)
                ));
                fs::write(&path, rendered)
                    .with_context(|| format!("writing {}", path.display()))?;
                Some(path)
            } else {
                None
            };

            match side {
                Side::Old => {
                    saved.old = Some(raw_path);
                    saved.old_annotated = annotated_path;
                }
                Side::New => {
                    saved.new = Some(raw_path);
                    saved.new_annotated = annotated_path;
                }
            }
        }
        Ok(saved)
    }

    /// One unified-diff file per changed definition, headed by the file
    /// identity and recent commit metadata.
    pub fn save_definition_diffs(
        &self,
        change: &FileChange,
        analysis: &FileAnalysis,
        subdir: &str,
        commits: &[CommitNote],
    ) -> Result<Vec<PathBuf>> {
        let dir = self.repo_dir(subdir, &change.repo);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;

        let (stem, _) = stem_and_extension(&change.path);
        let mut written = Vec::new();

        for record in analysis.changed_records() {
            let edits = match record.classification {
                Classification::Modified => record.edits.clone(),
                Classification::Added => match &record.new {
                    Some(def) => diff_lines(&[], &def.body_lines()),
                    None => continue,
                },
                Classification::Removed => match &record.old {
                    Some(def) => diff_lines(&def.body_lines(), &[]),
                    None => continue,
                },
                Classification::Unchanged => continue,
            };

            let old_start = record.old.as_ref().map(|d| d.start_line).unwrap_or(0);
            let new_start = record.new.as_ref().map(|d| d.start_line).unwrap_or(0);

            let mut content = String::new();
            content.push_str(&format!(
                "# Definition: {} ({})\n",
                record.name,
                record.kind.label()
            ));
            content.push_str(&format!(
                "# File: {} (status: {})\n",
                change.path,
                change.status.label()
            ));
            content.push_str(&format!(
                "# Old rev: {}  New rev: {}\n",
                change.old_rev.as_deref().unwrap_or("-"),
                change.new_rev.as_deref().unwrap_or("-")
            ));
            if !commits.is_empty() {
                content.push_str("# Recent commits:\n");
                for note in commits {
                    content.push_str(&format!(
                        "#   {} {} {}: {}\n",
                        short_sha(&note.sha),
                        note.date.as_deref().unwrap_or("-"),
                        note.author.as_deref().unwrap_or("unknown"),
                        note.subject
                    ));
                }
            }
            content.push('\n');
            content.push_str(&render_unified(
                &change.path,
                &record.name,
                old_start,
                new_start,
                &edits,
            ));

            let path = dir.join(format!("{stem}_{}.diff", record.name));
            fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }

    /// Run summary plus per-repository sections with side-by-side
    /// comparisons of every changed definition.
    pub fn write_comprehensive_report(
        &self,
        analyses: &[FileAnalysis],
        totals: &RunTotals,
        filename: &str,
    ) -> Result<PathBuf> {
        let mut by_repo: BTreeMap<&str, Vec<&FileAnalysis>> = BTreeMap::new();
        for analysis in analyses {
            by_repo.entry(&analysis.repo).or_default().push(analysis);
        }

        let overall = totals.overall();
        let mut out = String::new();
        out.push_str("GITHUB REPOSITORY PYTHON CHANGES COMPREHENSIVE ANALYSIS REPORT\n");
        out.push_str(&format!("{}\n\n", "=".repeat(80)));
        out.push_str("SUMMARY:\n");
        out.push_str(&format!(
            "Repositories analyzed: {}\n",
            totals.repo_count()
        ));
        out.push_str(&format!(
            "Total Python files changed: {}\n",
            overall.files_changed
        ));
        out.push_str(&format!(
            "Total definitions changed: {}\n",
            overall.definitions_changed()
        ));
        out.push_str(&format!(
            "Lines added: {}, changed: {}, removed: {}\n",
            overall.lines_added, overall.lines_changed, overall.lines_removed
        ));
        out.push_str(&format!(
            "Files skipped (parse errors): {}\n\n",
            overall.parse_failures
        ));

        for (repo, analyses) in &by_repo {
            let repo_totals = totals.repos.get(*repo).copied().unwrap_or_default();
            out.push_str(&format!("Repository: {repo}\n"));
            out.push_str(&format!("Files changed: {}\n", repo_totals.files_changed));
            out.push_str(&format!(
                "Definitions changed: {}\n",
                repo_totals.definitions_changed()
            ));
            out.push_str(&format!("{}\n\n", "=".repeat(60)));

            for analysis in analyses {
                out.push_str(&format!(
                    "File: {} (status: {})\n",
                    analysis.path,
                    analysis.status.label()
                ));
                out.push_str(&format!(
                    "Old rev: {}\n",
                    analysis.old_rev.as_deref().unwrap_or("-")
                ));
                out.push_str(&format!(
                    "New rev: {}\n",
                    analysis.new_rev.as_deref().unwrap_or("-")
                ));
                out.push_str(&format!("{}\n", "-".repeat(40)));

                if let Some(failure) = &analysis.failure {
                    out.push_str(&format!(
                        "Definition-level analysis skipped: {} (line {}, column {})\n\n",
                        failure.message, failure.line, failure.column
                    ));
                    continue;
                }

                for record in analysis.changed_records() {
                    out.push_str(&side_by_side(record));
                    out.push_str("\n\n");
                }
            }
            out.push_str(&format!("\n{}\n\n", "=".repeat(80)));
        }

        let path = self.output_dir.join(filename);
        fs::write(&path, out).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// Side-by-side comparison block for one changed definition.
fn side_by_side(record: &ChangeRecord) -> String {
    let mut out = vec![format!("\n{}", "=".repeat(80))];
    out.push(format!(
        "{}: {}",
        record.kind.label().to_uppercase(),
        record.name
    ));
    out.push("=".repeat(80));

    match record.classification {
        Classification::Added => {
            if let Some(def) = &record.new {
                out.push("STATUS: ADDED".to_string());
                out.push(format!("Decorators: {:?}", def.decorators));
                push_docstring(&mut out, def);
                out.push("\nNEW VERSION:".to_string());
                out.push("-".repeat(40));
                out.push(def.body_text.clone());
            }
        }
        Classification::Removed => {
            if let Some(def) = &record.old {
                out.push("STATUS: REMOVED".to_string());
                out.push(format!("Decorators: {:?}", def.decorators));
                push_docstring(&mut out, def);
                out.push("\nOLD VERSION:".to_string());
                out.push("-".repeat(40));
                out.push(def.body_text.clone());
            }
        }
        Classification::Modified => {
            if let (Some(old), Some(new)) = (&record.old, &record.new) {
                out.push("STATUS: MODIFIED".to_string());
                out.push(format!("Old decorators: {:?}", old.decorators));
                out.push(format!("New decorators: {:?}", new.decorators));
                out.push("\nOLD VERSION:".to_string());
                out.push("-".repeat(40));
                out.push(old.body_text.clone());
                out.push("\nNEW VERSION:".to_string());
                out.push("-".repeat(40));
                out.push(new.body_text.clone());
            }
        }
        Classification::Unchanged => {}
    }
    out.join("\n")
}

fn push_docstring(out: &mut Vec<String>, def: &Definition) {
    if let Some(docstring) = &def.docstring {
        let truncated: String = docstring.chars().take(100).collect();
        let suffix = if docstring.chars().count() > 100 {
            "..."
        } else {
            ""
        };
        out.push(format!("Docstring: {truncated}{suffix}"));
    }
}

fn stem_and_extension(path: &str) -> (String, String) {
    let path = Path::new(path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "py".to_string());
    (stem, ext)
}

/// Annotated-file extension per style: comment output is still source,
/// inline output is plain text, markup output is HTML.
fn style_extension(style: AnnotationStyle, source_ext: &str) -> String {
    match style {
        AnnotationStyle::Comment => source_ext.to_string(),
        AnnotationStyle::Inline => "txt".to_string(),
        AnnotationStyle::Markup => "html".to_string(),
    }
}

fn short_sha(sha: &str) -> &str {
    &sha[..sha.len().min(8)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::matcher::match_and_diff;
    use drift_core::model::{DefinitionKind, FileStatus};

    fn sample_definition(name: &str, start_line: usize, body: &str) -> Definition {
        Definition {
            name: name.to_string(),
            kind: DefinitionKind::Function,
            start_line,
            end_line: start_line + body.split('\n').count() - 1,
            body_text: body.to_string(),
            decorators: Vec::new(),
            docstring: Some("Calculate sum of two numbers".to_string()),
        }
    }

    fn sample_pair() -> (FileChange, FileAnalysis) {
        let old_text = "def calculate_sum(a, b):\n    result = a + b\n    return result";
        let new_text =
            "def calculate_sum(a, b, c=0):\n    result = a + b + c\n    return result";
        let old_def = sample_definition("calculate_sum", 0, old_text);
        let new_def = sample_definition("calculate_sum", 0, new_text);
        let records = match_and_diff(&[old_def], &[new_def]).into_values().collect();

        let change = FileChange {
            path: "src/calc.py".to_string(),
            repo: "owner/test-repo".to_string(),
            old_text: Some(old_text.to_string()),
            new_text: Some(new_text.to_string()),
            status: FileStatus::Modified,
            old_rev: Some("abc123".to_string()),
            new_rev: Some("def456".to_string()),
        };
        let analysis = FileAnalysis {
            path: change.path.clone(),
            repo: change.repo.clone(),
            status: change.status,
            old_rev: change.old_rev.clone(),
            new_rev: change.new_rev.clone(),
            records,
            failure: None,
        };
        (change, analysis)
    }

    #[test]
    fn file_versions_land_under_the_repo_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path(), AnnotationStyle::Comment).unwrap();
        let (change, analysis) = sample_pair();

        let saved = writer
            .save_file_versions(&change, &analysis, "file_versions", true)
            .unwrap();

        let base = dir.path().join("file_versions").join("owner_test-repo");
        assert_eq!(saved.old.unwrap(), base.join("calc_old.py"));
        assert_eq!(saved.new.unwrap(), base.join("calc_new.py"));
        let annotated = saved.new_annotated.unwrap();
        assert_eq!(annotated, base.join("calc_new_annotated.py"));

        let rendered = fs::read_to_string(annotated).unwrap();
        assert!(rendered.contains("# [CHANGED] def calculate_sum(a, b, c=0):"));
    }

    #[test]
    fn markup_style_writes_html() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path(), AnnotationStyle::Markup).unwrap();
        let (change, analysis) = sample_pair();

        let saved = writer
            .save_file_versions(&change, &analysis, "demo_markup", true)
            .unwrap();

        let annotated = saved.old_annotated.unwrap();
        assert!(annotated.to_string_lossy().ends_with("calc_old_annotated.html"));
        let rendered = fs::read_to_string(annotated).unwrap();
        assert!(rendered.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn definition_diffs_carry_commit_headers_and_hunks() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path(), AnnotationStyle::Comment).unwrap();
        let (change, analysis) = sample_pair();
        let commits = vec![CommitNote {
            sha: "abc123def456789".to_string(),
            author: Some("John Doe".to_string()),
            date: Some("2024-01-15T10:30:00Z".to_string()),
            subject: "Add optional third parameter".to_string(),
        }];

        let written = writer
            .save_definition_diffs(&change, &analysis, "diffs", &commits)
            .unwrap();

        assert_eq!(written.len(), 1);
        let content = fs::read_to_string(&written[0]).unwrap();
        assert!(content.contains("# Definition: calculate_sum (function)"));
        assert!(content.contains("#   abc123de 2024-01-15T10:30:00Z John Doe: Add optional third parameter"));
        assert!(content.contains("--- a/src/calc.py:calculate_sum"));
        assert!(content.contains("-def calculate_sum(a, b):"));
        assert!(content.contains("+def calculate_sum(a, b, c=0):"));
    }

    #[test]
    fn comprehensive_report_summarizes_and_details() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path(), AnnotationStyle::Comment).unwrap();
        let (change, analysis) = sample_pair();

        let old_summary = drift_core::annotate::annotate(
            &analysis,
            change.old_text.as_deref().unwrap(),
            Side::Old,
        )
        .summary;
        let new_summary = drift_core::annotate::annotate(
            &analysis,
            change.new_text.as_deref().unwrap(),
            Side::New,
        )
        .summary;
        let mut totals = RunTotals::default();
        totals.record_file(&analysis, Some(&old_summary), Some(&new_summary));

        let path = writer
            .write_comprehensive_report(
                std::slice::from_ref(&analysis),
                &totals,
                "comprehensive_report.txt",
            )
            .unwrap();

        let report = fs::read_to_string(path).unwrap();
        assert!(report.contains("Repositories analyzed: 1"));
        assert!(report.contains("Repository: owner/test-repo"));
        assert!(report.contains("FUNCTION: calculate_sum"));
        assert!(report.contains("STATUS: MODIFIED"));
        assert!(report.contains("OLD VERSION:"));
        assert!(report.contains("NEW VERSION:"));
    }
}
