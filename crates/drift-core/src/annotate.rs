//! Marker merge over full file texts and the pluggable renderings

use crate::model::{
    AnnotatedFile, AnnotatedLine, AnnotationStyle, ChangeSummary, Classification, Definition,
    EditOp, FileAnalysis, LineEdit, LineMarker, Side,
};

/// Merge per-definition change classifications back onto the full file text
/// for one side.
///
/// Added definitions mark every line Added (new side only), Removed mark
/// every line Removed (old side only), Modified definitions take their
/// markers from the line-level edit script. Top-level lines and Unchanged
/// definitions stay unmarked. The output never reorders, drops, or
/// duplicates a line: stripping all markers reproduces `file_text` exactly,
/// and the line count is preserved for every classification.
pub fn annotate(analysis: &FileAnalysis, file_text: &str, side: Side) -> AnnotatedFile {
    let lines: Vec<&str> = file_text.split('\n').collect();
    let mut markers = vec![LineMarker::None; lines.len()];

    for record in &analysis.records {
        match record.classification {
            Classification::Added => {
                if side == Side::New {
                    if let Some(def) = &record.new {
                        mark_span(&mut markers, def, LineMarker::Added);
                    }
                }
            }
            Classification::Removed => {
                if side == Side::Old {
                    if let Some(def) = &record.old {
                        mark_span(&mut markers, def, LineMarker::Removed);
                    }
                }
            }
            Classification::Modified => {
                let def = match side {
                    Side::Old => record.old.as_ref(),
                    Side::New => record.new.as_ref(),
                };
                if let Some(def) = def {
                    mark_modified(&mut markers, def, &record.edits, side);
                }
            }
            Classification::Unchanged => {}
        }
    }

    let mut summary = ChangeSummary::default();
    for marker in &markers {
        match marker {
            LineMarker::Changed => summary.lines_changed += 1,
            LineMarker::Added => summary.lines_added += 1,
            LineMarker::Removed => summary.lines_removed += 1,
            LineMarker::None => summary.lines_unchanged += 1,
        }
    }

    AnnotatedFile {
        lines: lines
            .into_iter()
            .zip(markers)
            .map(|(text, marker)| AnnotatedLine {
                text: text.to_string(),
                marker,
            })
            .collect(),
        summary,
        repo: analysis.repo.clone(),
        path: analysis.path.clone(),
        status: analysis.status,
        old_rev: analysis.old_rev.clone(),
        new_rev: analysis.new_rev.clone(),
    }
}

fn mark_span(markers: &mut [LineMarker], def: &Definition, marker: LineMarker) {
    for line in def.start_line..=def.end_line {
        if let Some(slot) = markers.get_mut(line) {
            *slot = marker;
        }
    }
}

/// Apply edit-script markers for one Modified definition.
///
/// Deletes and Inserts are paired positionally within each run between
/// Equal anchors: the k-th Delete aligns with the k-th Insert and both
/// render as Changed; leftovers are Removed (old side) or Added (new side).
fn mark_modified(markers: &mut [LineMarker], def: &Definition, edits: &[LineEdit], side: Side) {
    let mut gap_deletes: Vec<usize> = Vec::new();
    let mut gap_inserts: Vec<usize> = Vec::new();

    for edit in edits {
        match edit.op {
            EditOp::Equal => {
                flush_gap(markers, def, side, &mut gap_deletes, &mut gap_inserts);
            }
            EditOp::Delete => {
                if let Some(line) = edit.old_line {
                    gap_deletes.push(line);
                }
            }
            EditOp::Insert => {
                if let Some(line) = edit.new_line {
                    gap_inserts.push(line);
                }
            }
        }
    }
    flush_gap(markers, def, side, &mut gap_deletes, &mut gap_inserts);
}

fn flush_gap(
    markers: &mut [LineMarker],
    def: &Definition,
    side: Side,
    deletes: &mut Vec<usize>,
    inserts: &mut Vec<usize>,
) {
    let paired = deletes.len().min(inserts.len());
    let (lines, lone_marker) = match side {
        Side::Old => (&*deletes, LineMarker::Removed),
        Side::New => (&*inserts, LineMarker::Added),
    };
    for (k, &line) in lines.iter().enumerate() {
        let marker = if k < paired {
            LineMarker::Changed
        } else {
            lone_marker
        };
        if let Some(slot) = markers.get_mut(def.start_line + line) {
            *slot = marker;
        }
    }
    deletes.clear();
    inserts.clear();
}

/// Reassemble the original file text from an annotated file, discarding the
/// markers. Inverse of `annotate` for every style.
pub fn strip_markers(file: &AnnotatedFile) -> String {
    file.lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn marker_tag(marker: LineMarker) -> Option<&'static str> {
    match marker {
        LineMarker::None => None,
        LineMarker::Changed => Some("[CHANGED]"),
        LineMarker::Added => Some("[ADDED]"),
        LineMarker::Removed => Some("[REMOVED]"),
    }
}

/// Render an annotated file in the requested style. All three strategies
/// operate on the same marked-line data; only the presentation differs.
pub fn render(file: &AnnotatedFile, style: AnnotationStyle) -> String {
    match style {
        AnnotationStyle::Comment => render_comment(file),
        AnnotationStyle::Inline => render_inline(file),
        AnnotationStyle::Markup => render_markup(file),
    }
}

fn summary_line(summary: &ChangeSummary) -> String {
    format!(
        "{} changed, {} added, {} removed, {} unchanged",
        summary.lines_changed, summary.lines_added, summary.lines_removed, summary.lines_unchanged
    )
}

fn header_fields(file: &AnnotatedFile) -> Vec<String> {
    vec![
        format!("repo: {}", file.repo),
        format!("path: {}", file.path),
        format!("status: {}", file.status.label()),
        format!("old rev: {}", file.old_rev.as_deref().unwrap_or("-")),
        format!("new rev: {}", file.new_rev.as_deref().unwrap_or("-")),
        format!("lines: {}", summary_line(&file.summary)),
    ]
}

/// Comment style: a `#` line-comment prefix plus a bracketed tag on marked
/// lines only; unmarked lines pass through verbatim, so the output still
/// parses as Python.
fn render_comment(file: &AnnotatedFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n", "=".repeat(70)));
    for field in header_fields(file) {
        out.push_str(&format!("# {field}\n"));
    }
    out.push_str(&format!("# {}\n", "=".repeat(70)));

    let mut lines = Vec::with_capacity(file.lines.len());
    for line in &file.lines {
        match marker_tag(line.marker) {
            Some(tag) => lines.push(format!("# {tag} {}", line.text)),
            None => lines.push(line.text.clone()),
        }
    }
    out.push_str(&lines.join("\n"));
    out
}

/// Inline style: a visible non-comment prefix on marked lines. Optimized
/// for human scanning, not re-parsing.
fn render_inline(file: &AnnotatedFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=".repeat(72)));
    for field in header_fields(file) {
        out.push_str(&format!("{field}\n"));
    }
    out.push_str(&format!("{}\n", "=".repeat(72)));

    let mut lines = Vec::with_capacity(file.lines.len());
    for line in &file.lines {
        match marker_tag(line.marker) {
            Some(tag) => lines.push(format!(">>> {tag} {}", line.text)),
            None => lines.push(line.text.clone()),
        }
    }
    out.push_str(&lines.join("\n"));
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn marker_class(marker: LineMarker) -> &'static str {
    match marker {
        LineMarker::None => "line",
        LineMarker::Changed => "line changed",
        LineMarker::Added => "line added",
        LineMarker::Removed => "line removed",
    }
}

/// Markup style: a standalone HTML document with one styled container per
/// line, a legend, and the change summary up top.
fn render_markup(file: &AnnotatedFile) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(&file.path)));
    out.push_str(
        "<style>\n\
         body { font-family: monospace; background: #fafafa; }\n\
         .header { background: #eee; padding: 8px; margin-bottom: 8px; }\n\
         .legend span { padding: 0 6px; margin-right: 8px; }\n\
         .line { white-space: pre; }\n\
         .changed { background: #fff3b0; }\n\
         .added { background: #c8f7c5; }\n\
         .removed { background: #f7c5c5; }\n\
         </style>\n</head>\n<body>\n",
    );

    out.push_str("<div class=\"header\">\n");
    for field in header_fields(file) {
        out.push_str(&format!("<div>{}</div>\n", escape_html(&field)));
    }
    out.push_str("</div>\n");
    out.push_str(
        "<div class=\"legend\">\n\
         <span class=\"changed\">changed</span>\n\
         <span class=\"added\">added</span>\n\
         <span class=\"removed\">removed</span>\n\
         </div>\n",
    );

    out.push_str("<div class=\"code\">\n");
    for line in &file.lines {
        out.push_str(&format!(
            "<div class=\"{}\">{}</div>\n",
            marker_class(line.marker),
            escape_html(&line.text)
        ));
    }
    out.push_str("</div>\n</body>\n</html>\n");
    out
}
