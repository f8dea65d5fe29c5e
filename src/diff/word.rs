use serde::{Deserialize, Serialize};

use super::line::LineKind;
use super::myers::{self, Edit};

/// A fragment of an inline diff between two lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordChange {
    pub kind: LineKind,
    pub value: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Word,
    Space,
    Other,
}

fn classify(c: char) -> TokenClass {
    if c.is_alphanumeric() || c == '_' {
        TokenClass::Word
    } else if c.is_whitespace() {
        TokenClass::Space
    } else {
        TokenClass::Other
    }
}

/// Runs of word characters, runs of whitespace, and single punctuation
/// characters.
fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<TokenClass> = None;

    for (pos, c) in line.char_indices() {
        let class = classify(c);
        match current {
            Some(prev) if prev == class && class != TokenClass::Other => {}
            Some(_) => {
                tokens.push(&line[start..pos]);
                start = pos;
            }
            None => {}
        }
        current = Some(class);
    }
    if start < line.len() {
        tokens.push(&line[start..]);
    }
    tokens
}

/// Word-level diff of a single line pair, for inline highlighting.
/// Adjacent fragments of the same kind are merged.
pub fn word_diff(old_line: &str, new_line: &str) -> Vec<WordChange> {
    let old_tokens = tokenize(old_line);
    let new_tokens = tokenize(new_line);

    let mut changes: Vec<WordChange> = Vec::new();
    for edit in myers::diff(&old_tokens, &new_tokens) {
        let (kind, value) = match edit {
            Edit::Equal(i, _) => (LineKind::Unchanged, old_tokens[i]),
            Edit::Delete(i) => (LineKind::Removed, old_tokens[i]),
            Edit::Insert(j) => (LineKind::Added, new_tokens[j]),
        };
        match changes.last_mut() {
            Some(last) if last.kind == kind => last.value.push_str(value),
            _ => changes.push(WordChange { kind, value: value.to_string() }),
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("model: gpt-4o  mini"),
            vec!["model", ":", " ", "gpt", "-", "4o", "  ", "mini"]
        );
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_single_word_change() {
        let changes = word_diff("temperature: 0.7", "temperature: 0.9");
        assert_eq!(
            changes,
            vec![
                WordChange { kind: LineKind::Unchanged, value: "temperature: 0.".to_string() },
                WordChange { kind: LineKind::Removed, value: "7".to_string() },
                WordChange { kind: LineKind::Added, value: "9".to_string() },
            ]
        );
    }

    #[test]
    fn test_fragments_rebuild_both_lines() {
        let old = "name: support bot v1";
        let new = "name: sales bot v2 (beta)";
        let changes = word_diff(old, new);
        let rebuilt_old: String = changes
            .iter()
            .filter(|c| c.kind != LineKind::Added)
            .map(|c| c.value.as_str())
            .collect();
        let rebuilt_new: String = changes
            .iter()
            .filter(|c| c.kind != LineKind::Removed)
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(rebuilt_old, old);
        assert_eq!(rebuilt_new, new);
    }
}
