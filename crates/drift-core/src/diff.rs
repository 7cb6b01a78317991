//! Line-level diff for modified definition bodies

use crate::model::{EditOp, LineEdit};

/// Compute a minimal edit script between two line sequences.
///
/// Longest-common-subsequence alignment over exact string equality, O(N·M)
/// on body line counts. The DP table is built over suffixes and walked from
/// the front, so when several minimal alignments exist the earliest match
/// wins: single-parameter and single-statement edits come out as one
/// Delete/Insert pair instead of a shifted hunk. Within each gap between
/// matches, Deletes are emitted before Inserts.
pub fn diff_lines(old: &[&str], new: &[&str]) -> Vec<LineEdit> {
    let n = old.len();
    let m = new.len();

    // lcs[i][j] = LCS length of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut edits = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if old[i] == new[j] {
            edits.push(LineEdit {
                op: EditOp::Equal,
                old_line: Some(i),
                new_line: Some(j),
                text: old[i].to_string(),
            });
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            edits.push(LineEdit {
                op: EditOp::Delete,
                old_line: Some(i),
                new_line: None,
                text: old[i].to_string(),
            });
            i += 1;
        } else {
            edits.push(LineEdit {
                op: EditOp::Insert,
                old_line: None,
                new_line: Some(j),
                text: new[j].to_string(),
            });
            j += 1;
        }
    }
    while i < n {
        edits.push(LineEdit {
            op: EditOp::Delete,
            old_line: Some(i),
            new_line: None,
            text: old[i].to_string(),
        });
        i += 1;
    }
    while j < m {
        edits.push(LineEdit {
            op: EditOp::Insert,
            old_line: None,
            new_line: Some(j),
            text: new[j].to_string(),
        });
        j += 1;
    }
    edits
}

/// Render a conventional unified diff over an edit script.
///
/// Pure formatting over the same `LineEdit` data: a `---`/`+++` file header
/// and a single hunk covering the whole definition body (bodies are
/// function-sized, so one hunk is the natural granularity). `old_start` and
/// `new_start` are the definitions' 0-based start lines in their files.
pub fn render_unified(
    path: &str,
    name: &str,
    old_start: usize,
    new_start: usize,
    edits: &[LineEdit],
) -> String {
    let old_count = edits
        .iter()
        .filter(|e| e.op == EditOp::Equal || e.op == EditOp::Delete)
        .count();
    let new_count = edits
        .iter()
        .filter(|e| e.op == EditOp::Equal || e.op == EditOp::Insert)
        .count();

    let mut out = String::new();
    out.push_str(&format!("--- a/{path}:{name}\n"));
    out.push_str(&format!("+++ b/{path}:{name}\n"));
    out.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        old_start + 1,
        old_count,
        new_start + 1,
        new_count
    ));
    for edit in edits {
        let prefix = match edit.op {
            EditOp::Equal => ' ',
            EditOp::Delete => '-',
            EditOp::Insert => '+',
        };
        out.push(prefix);
        out.push_str(&edit.text);
        out.push('\n');
    }
    out
}
