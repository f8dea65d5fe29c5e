use serde_yaml::Value;

use super::field::{diff_fields, flatten_fields, FieldDiff, FlatFields};

/// Field-level diff over parsed YAML documents. Mapping keys join with `.`,
/// sequence items are addressed as `path[i]`. Values compare by their
/// stringified form (JSON for non-string scalars). Falls back to the
/// indentation scanner when either side does not parse.
pub fn structural_field_diff(old_text: &str, new_text: &str) -> Vec<FieldDiff> {
    match (flatten_document(old_text), flatten_document(new_text)) {
        (Ok(old), Ok(new)) => diff_fields(&old, &new),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("structural diff unavailable, using line scanner: {}", e);
            diff_fields(&flatten_fields(old_text), &flatten_fields(new_text))
        }
    }
}

/// Flattens a YAML document into canonical paths. An empty document
/// flattens to no fields.
pub fn flatten_document(text: &str) -> Result<FlatFields, serde_yaml::Error> {
    let mut fields = FlatFields::new();
    if text.trim().is_empty() {
        return Ok(fields);
    }
    let document: Value = serde_yaml::from_str(text)?;
    flatten_value("", &document, &mut fields);
    Ok(fields)
}

fn flatten_value(path: &str, value: &Value, fields: &mut FlatFields) {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            for (key, child) in map {
                let key = scalar_key(key);
                let child_path = if path.is_empty() {
                    key
                } else {
                    format!("{}.{}", path, key)
                };
                flatten_value(&child_path, child, fields);
            }
        }
        Value::Sequence(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten_value(&format!("{}[{}]", path, i), child, fields);
            }
        }
        Value::Tagged(tagged) => flatten_value(path, &tagged.value, fields),
        leaf => {
            if !path.is_empty() {
                fields.insert(path.to_string(), canonical(leaf));
            }
        }
    }
}

fn scalar_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => canonical(other),
    }
}

fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        // Numbers, bools and empty collections use their JSON form
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{:?}", other)),
    }
}
