use agent_history::{
    diff::{compare, compare_with_mode, field_diff, line_diff, word_diff, LineKind},
    history::ChangeType,
    FieldDiffMode,
};

const BASE: &str = "\
name: triage-agent
model:
  provider: openai
  params:
    temperature: 0.2
    top_p: 0.9
tools:
  search: enabled
prompt: Classify incoming tickets.
";

const EDITED: &str = "\
name: triage-agent
model:
  provider: openai
  params:
    temperature: 0.4
tools:
  search: enabled
  escalate: enabled
prompt: Classify incoming tickets.
owner: support
";

#[test]
fn identical_texts_have_no_changes() {
    for text in [BASE, EDITED, "", "single: line"] {
        let result = compare(text, text);
        assert_eq!(result.line_diff.additions, 0);
        assert_eq!(result.line_diff.deletions, 0);
        assert_eq!(result.summary.modified, 0);
        assert_eq!(result.line_diff.unchanged, text.lines().count());
    }
}

#[test]
fn line_counts_swap_with_direction() {
    let pairs = [(BASE, EDITED), ("", BASE), ("a\nb\nc\n", "c\nb\na\n"), ("x\n", "y\n")];
    for (a, b) in pairs {
        let forward = line_diff(a, b);
        let backward = line_diff(b, a);
        assert_eq!(forward.additions, backward.deletions);
        assert_eq!(forward.deletions, backward.additions);
    }
}

#[test]
fn line_numbers_follow_each_side() {
    let diff = line_diff(BASE, EDITED);
    let mut old_expected = 1;
    let mut new_expected = 1;
    for line in &diff.lines {
        match line.kind {
            LineKind::Removed => {
                assert_eq!(line.old_line, Some(old_expected));
                old_expected += 1;
            }
            LineKind::Added => {
                assert_eq!(line.new_line, Some(new_expected));
                new_expected += 1;
            }
            LineKind::Unchanged => {
                assert_eq!(line.old_line, Some(old_expected));
                assert_eq!(line.new_line, Some(new_expected));
                old_expected += 1;
                new_expected += 1;
            }
        }
    }
    assert_eq!(old_expected - 1, BASE.lines().count());
    assert_eq!(new_expected - 1, EDITED.lines().count());
}

#[test]
fn field_diff_of_agent_edit() {
    let diffs = field_diff(BASE, EDITED);
    let summary: Vec<(&str, ChangeType)> =
        diffs.iter().map(|d| (d.path.as_str(), d.kind)).collect();
    assert_eq!(
        summary,
        vec![
            ("model.params.temperature", ChangeType::Modified),
            ("model.params.top_p", ChangeType::Removed),
            ("tools.escalate", ChangeType::Added),
            ("owner", ChangeType::Added),
        ]
    );
    assert_eq!(diffs[0].old_value.as_deref(), Some("0.2"));
    assert_eq!(diffs[0].new_value.as_deref(), Some("0.4"));
    assert_eq!(diffs[1].new_value, None);
    assert_eq!(diffs[2].old_value, None);
}

#[test]
fn summary_counts_field_kinds() {
    let result = compare(BASE, EDITED);
    assert_eq!(result.summary.added, 2);
    assert_eq!(result.summary.removed, 1);
    assert_eq!(result.summary.modified, 1);
    assert_eq!(result.field_diffs.len(), 4);
}

#[test]
fn structural_mode_handles_lists() {
    let old = "tools:\n  - search\n  - escalate\n";
    let new = "tools:\n  - search\n  - summarize\n";
    // the line scanner ignores sequence items entirely
    assert!(compare_with_mode(old, new, FieldDiffMode::Flat).field_diffs.is_empty());

    let structural = compare_with_mode(old, new, FieldDiffMode::Structural);
    assert_eq!(structural.field_diffs.len(), 1);
    assert_eq!(structural.field_diffs[0].path, "tools[1]");
    assert_eq!(structural.field_diffs[0].kind, ChangeType::Modified);
}

#[test]
fn word_diff_highlights_changed_token() {
    let changes = word_diff("  temperature: 0.2", "  temperature: 0.4");
    let added: Vec<&str> = changes
        .iter()
        .filter(|c| c.kind == LineKind::Added)
        .map(|c| c.value.as_str())
        .collect();
    let removed: Vec<&str> = changes
        .iter()
        .filter(|c| c.kind == LineKind::Removed)
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(added, vec!["4"]);
    assert_eq!(removed, vec!["2"]);
}
