use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::domain::config::{normalize_tag, ImageOption};

use super::schema::{Schema, REPEATING_SECTION_KEY};
use super::{Binding, Row};

/// Sentinel the form uses for "no data"; does not count as populated.
const NA_SENTINEL: &str = "N/A";

/// Output of placeholder resolution: the flat binding map handed to the
/// renderer, the set of keys the template treats as images, and the
/// caller-visible count of populated fields.
pub struct ResolvedPlaceholders {
    pub bindings: HashMap<String, Binding>,
    pub image_tags: HashSet<String>,
    pub populated: usize,
}

/// Maps the nested form payload to a flat placeholder map under `schema`.
///
/// Every schema-declared field resolves; values the payload lacks default
/// to the empty string. The populated counter increments for each resolved
/// value that is non-empty and not the `"N/A"` sentinel.
pub fn resolve(
    form: &Value,
    schema: &Schema,
    image_options: &[ImageOption],
) -> ResolvedPlaceholders {
    let mut bindings = HashMap::new();
    let mut populated = 0usize;

    for mapping in &schema.fields {
        let value = leaf_string(form, &mapping.section, &mapping.field);
        if is_populated(&value) {
            populated += 1;
        }
        bindings.insert(normalize_tag(&mapping.placeholder), Binding::Text(value));
    }

    for (placeholder, content) in &schema.globals {
        if is_populated(content) {
            populated += 1;
        }
        bindings.insert(
            normalize_tag(placeholder),
            Binding::Text(content.clone()),
        );
    }

    if let Some((section, field)) = &schema.repeating_source {
        let rows = resolve_rows(form, section, field, &schema.row_fields);
        bindings.insert(REPEATING_SECTION_KEY.to_string(), Binding::Rows(rows));
    }

    let image_tags = image_options
        .iter()
        .map(|o| normalize_tag(&o.placeholder))
        .collect();

    ResolvedPlaceholders {
        bindings,
        image_tags,
        populated,
    }
}

fn is_populated(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != NA_SENTINEL
}

/// Looks up `form[section][field]`, stringifying scalars and defaulting
/// anything absent or non-scalar to the empty string.
fn leaf_string(form: &Value, section: &str, field: &str) -> String {
    match form.get(section).and_then(|s| s.get(field)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn resolve_rows(
    form: &Value,
    section: &str,
    field: &str,
    row_fields: &[(String, String)],
) -> Vec<Row> {
    let Some(entries) = form
        .get(section)
        .and_then(|s| s.get(field))
        .and_then(|v| v.as_array())
    else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| {
            let mut row = Row::new();
            for (form_field, row_key) in row_fields {
                let value = match entry.get(form_field) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    _ => String::new(),
                };
                row.insert(row_key.clone(), value);
            }
            row
        })
        .collect()
}
