use serde_json::{Map, Value, json};

use crate::spec::field::{FieldKind, FieldSpec};
use crate::visibility::VisibilityMap;

/// JSON schema describing valid answers for the currently visible fields.
pub fn generate(fields: &[FieldSpec], visibility: &VisibilityMap) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        if !visibility.get(&field.id).copied().unwrap_or(true) {
            continue;
        }
        properties.insert(field.id.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(field.id.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn field_schema(field: &FieldSpec) -> Value {
    let options = field.options.clone().unwrap_or_default();
    let mut schema = match field.kind {
        FieldKind::ShortText | FieldKind::LongText => json!({ "type": "string" }),
        FieldKind::SingleSelect => json!({ "type": "string", "enum": options }),
        FieldKind::MultiSelect => json!({
            "type": "array",
            "items": { "type": "string", "enum": options },
        }),
        FieldKind::Boolean => json!({ "type": "boolean" }),
        // Numeric fields tolerate string input from partially-typed values.
        FieldKind::Numeric => json!({ "type": ["number", "string"] }),
    };

    if let Some(object) = schema.as_object_mut() {
        object.insert("title".into(), Value::String(field.label.clone()));
        if let Some(help) = &field.help_text {
            object.insert("description".into(), Value::String(help.clone()));
        }
    }

    schema
}
