//! Line, word and field level differences between configuration texts.

mod compare;
mod field;
mod line;
mod myers;
mod structural;
mod word;

pub use compare::{
    compare, compare_with_mode, field_diff_with_mode, ComparisonResult, ComparisonSummary,
};
pub use field::{diff_fields, field_diff, flatten_fields, FieldDiff, FlatFields};
pub use line::{line_diff, split_lines, DiffLine, DiffResult, LineKind};
pub use structural::{flatten_document, structural_field_diff};
pub use word::{word_diff, WordChange};
