use serde::{Deserialize, Serialize};

use super::myers::{self, Edit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Added,
    Removed,
    Unchanged,
}

/// One line of a rendered diff. Removed lines carry only their old-side
/// number, added lines only their new-side number, unchanged lines both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    pub old_line: Option<usize>,
    pub new_line: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub lines: Vec<DiffLine>,
    pub additions: usize,
    pub deletions: usize,
    pub unchanged: usize,
}

/// Splits text into lines. A final newline does not produce a trailing
/// empty line, and empty text has no lines at all.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Classifies every line of both texts as added, removed or unchanged.
pub fn line_diff(old_text: &str, new_text: &str) -> DiffResult {
    let old_lines = split_lines(old_text);
    let new_lines = split_lines(new_text);

    let mut result = DiffResult::default();
    for edit in myers::diff(&old_lines, &new_lines) {
        let line = match edit {
            Edit::Equal(i, j) => {
                result.unchanged += 1;
                DiffLine {
                    kind: LineKind::Unchanged,
                    content: old_lines[i].to_string(),
                    old_line: Some(i + 1),
                    new_line: Some(j + 1),
                }
            }
            Edit::Delete(i) => {
                result.deletions += 1;
                DiffLine {
                    kind: LineKind::Removed,
                    content: old_lines[i].to_string(),
                    old_line: Some(i + 1),
                    new_line: None,
                }
            }
            Edit::Insert(j) => {
                result.additions += 1;
                DiffLine {
                    kind: LineKind::Added,
                    content: new_lines[j].to_string(),
                    old_line: None,
                    new_line: Some(j + 1),
                }
            }
        };
        result.lines.push(line);
    }
    result
}
