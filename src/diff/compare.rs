use serde::{Deserialize, Serialize};

use super::field::{field_diff, FieldDiff};
use super::line::{line_diff, DiffResult};
use super::structural::structural_field_diff;
use crate::config::FieldDiffMode;
use crate::history::ChangeType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub line_diff: DiffResult,
    pub field_diffs: Vec<FieldDiff>,
    pub summary: ComparisonSummary,
}

impl ComparisonResult {
    pub fn is_identical(&self) -> bool {
        self.line_diff.additions == 0
            && self.line_diff.deletions == 0
            && self.field_diffs.is_empty()
    }
}

/// Line diff plus flat field diff of two configuration texts.
pub fn compare(old_text: &str, new_text: &str) -> ComparisonResult {
    compare_with_mode(old_text, new_text, FieldDiffMode::Flat)
}

pub fn compare_with_mode(old_text: &str, new_text: &str, mode: FieldDiffMode) -> ComparisonResult {
    let line_diff = line_diff(old_text, new_text);
    let field_diffs = field_diff_with_mode(old_text, new_text, mode);

    let mut summary = ComparisonSummary::default();
    for diff in &field_diffs {
        match diff.kind {
            ChangeType::Added => summary.added += 1,
            ChangeType::Removed => summary.removed += 1,
            ChangeType::Modified => summary.modified += 1,
        }
    }

    ComparisonResult { line_diff, field_diffs, summary }
}

/// Field changes only, extracted the way `mode` prescribes.
pub fn field_diff_with_mode(old_text: &str, new_text: &str, mode: FieldDiffMode) -> Vec<FieldDiff> {
    match mode {
        FieldDiffMode::Flat => field_diff(old_text, new_text),
        FieldDiffMode::Structural => structural_field_diff(old_text, new_text),
    }
}
