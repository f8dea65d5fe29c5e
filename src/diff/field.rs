use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::history::ChangeType;

/// A change to one flattened configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

/// Dotted path to string value, in first-seen order. Re-inserting a path
/// keeps its original position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatFields {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl FlatFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: String, value: String) {
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, value));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.index.get(path).map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

struct Container {
    key: String,
    indent: usize,
}

/// Approximate `key: value` extraction by indentation. Keys with an empty
/// value are containers and prefix the paths of deeper lines. Sequence
/// items, multi-line scalars and quoting get no special treatment.
pub fn flatten_fields(text: &str) -> FlatFields {
    let mut fields = FlatFields::new();
    let mut stack: Vec<Container> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim();

        while stack.last().is_some_and(|c| c.indent >= indent) {
            stack.pop();
        }

        if value.is_empty() {
            stack.push(Container { key: key.to_string(), indent });
        } else {
            let path = stack
                .iter()
                .map(|c| c.key.as_str())
                .chain(std::iter::once(key))
                .collect::<Vec<_>>()
                .join(".");
            fields.insert(path, value.to_string());
        }
    }
    fields
}

/// Compares two flattened maps over the union of their paths, old paths
/// first, then paths only present in `new`.
pub fn diff_fields(old: &FlatFields, new: &FlatFields) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();

    for (path, old_value) in old.iter() {
        match new.get(path) {
            None => diffs.push(FieldDiff {
                path: path.to_string(),
                kind: ChangeType::Removed,
                old_value: Some(old_value.to_string()),
                new_value: None,
            }),
            Some(new_value) if new_value != old_value => diffs.push(FieldDiff {
                path: path.to_string(),
                kind: ChangeType::Modified,
                old_value: Some(old_value.to_string()),
                new_value: Some(new_value.to_string()),
            }),
            Some(_) => {}
        }
    }

    for (path, new_value) in new.iter() {
        if old.get(path).is_none() {
            diffs.push(FieldDiff {
                path: path.to_string(),
                kind: ChangeType::Added,
                old_value: None,
                new_value: Some(new_value.to_string()),
            });
        }
    }

    diffs
}

/// Field-level diff using the indentation scanner.
pub fn field_diff(old_text: &str, new_text: &str) -> Vec<FieldDiff> {
    diff_fields(&flatten_fields(old_text), &flatten_fields(new_text))
}
