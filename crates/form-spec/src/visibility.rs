use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::spec::field::FieldSpec;

pub type VisibilityMap = BTreeMap<String, bool>;

/// Recomputes which fields are visible for the given answers.
///
/// A field with no rule is always visible. A rule matches only by explicit
/// membership: an unset controlling answer never matches, even when
/// `allowed_values` carries an empty-string sentinel. A `depends_on` naming
/// an unknown or non-earlier field leaves the dependent field hidden.
///
/// This is a pure projection, recomputed on every answer change; answers for
/// currently hidden fields are deliberately kept around by callers so that
/// re-showing a field restores prior input.
pub fn resolve_visibility(fields: &[FieldSpec], answers: &Map<String, Value>) -> VisibilityMap {
    let mut map = VisibilityMap::new();
    let mut earlier: BTreeSet<&str> = BTreeSet::new();

    for field in fields {
        let visible = match &field.visibility_rule {
            None => true,
            Some(rule) => {
                earlier.contains(rule.depends_on.as_str())
                    && answers
                        .get(&rule.depends_on)
                        .is_some_and(|value| value_matches(value, &rule.allowed_values))
            }
        };
        map.insert(field.id.clone(), visible);
        earlier.insert(field.id.as_str());
    }

    map
}

/// Ordered projection of the catalogue onto its currently visible subset.
pub fn visible_fields<'a>(
    fields: &'a [FieldSpec],
    answers: &Map<String, Value>,
) -> Vec<&'a FieldSpec> {
    let map = resolve_visibility(fields, answers);
    fields
        .iter()
        .filter(|field| map.get(&field.id).copied().unwrap_or(false))
        .collect()
}

fn value_matches(value: &Value, allowed: &BTreeSet<String>) -> bool {
    match value {
        Value::String(text) => allowed.contains(text),
        Value::Bool(flag) => allowed.contains(if *flag { "true" } else { "false" }),
        Value::Number(num) => allowed.contains(&num.to_string()),
        Value::Array(items) => items.iter().any(|item| value_matches(item, allowed)),
        _ => false,
    }
}
