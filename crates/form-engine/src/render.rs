use serde::Serialize;
use serde_json::Value;

use form_spec::{FieldKind, answers_schema, resolve_visibility};

use crate::session::Session;

/// Status labels exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    /// More input is required.
    NeedInput,
    /// All visible fields are completed.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone, Serialize)]
pub struct RenderProgress {
    pub completed: usize,
    pub total: usize,
}

/// One catalogue field as a renderer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderField {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(rename = "kind")]
    pub kind_label: &'static str,
    pub required: bool,
    pub visible: bool,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Collected payload used by both the text and JSON renderers.
#[derive(Debug, Clone, Serialize)]
pub struct RenderPayload {
    pub status: RenderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_field_id: Option<String>,
    pub progress: RenderProgress,
    pub completion_fraction: f64,
    pub fields: Vec<RenderField>,
    pub schema: Value,
}

/// Projects a session into a renderer payload. Pure; no I/O.
pub fn build_render_payload(session: &Session) -> RenderPayload {
    let visibility = resolve_visibility(session.fields(), session.answers());
    let visible_total = visibility.values().filter(|visible| **visible).count();
    let completed_visible = session
        .fields()
        .iter()
        .filter(|field| {
            visibility.get(&field.id).copied().unwrap_or(false)
                && session.is_field_completed(&field.id)
        })
        .count();

    let fields = session
        .fields()
        .iter()
        .map(|field| RenderField {
            id: field.id.clone(),
            label: field.label.clone(),
            help_text: field.help_text.clone(),
            kind_label: field.kind.label(),
            required: field.required,
            visible: visibility.get(&field.id).copied().unwrap_or(false),
            completed: session.is_field_completed(&field.id),
            current_value: session.answers().get(&field.id).cloned(),
            error: session.errors().get(&field.id).cloned(),
            options: field.options.clone(),
        })
        .collect();

    RenderPayload {
        status: if session.is_complete() {
            RenderStatus::Complete
        } else {
            RenderStatus::NeedInput
        },
        current_field_id: session.current_field().map(|field| field.id.clone()),
        progress: RenderProgress {
            completed: completed_visible,
            total: visible_total,
        },
        completion_fraction: session.completion_fraction(),
        fields,
        schema: answers_schema(session.fields(), &visibility),
    }
}

/// Renders the payload as a structured JSON value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

/// Renders the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.completed,
        payload.progress.total
    ));

    if let Some(current) = &payload.current_field_id {
        lines.push(format!("Current field: {current}"));
        if let Some(field) = payload.fields.iter().find(|field| &field.id == current) {
            lines.push(format!("  Label: {}", field.label));
            if let Some(help) = &field.help_text {
                lines.push(format!("  Help: {help}"));
            }
            if field.required {
                lines.push("  Required: yes".to_string());
            }
            if let Some(value) = &field.current_value {
                lines.push(format!("  Current value: {}", value_to_display(value)));
            }
            if let Some(error) = &field.error {
                lines.push(format!("  Error: {error}"));
            }
        }
    } else {
        lines.push("All visible fields are completed.".to_string());
    }

    lines.push("Visible fields:".to_string());
    for field in payload.fields.iter().filter(|field| field.visible) {
        let mut entry = format!(" - {} ({})", field.id, field.label);
        if field.required {
            entry.push_str(" [required]");
        }
        if field.completed {
            entry.push_str(" [done]");
        }
        if let Some(value) = &field.current_value {
            entry.push_str(&format!(" = {}", value_to_display(value)));
        }
        lines.push(entry);
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        other => other.to_string(),
    }
}

/// Kind-specific input hint shown next to a prompt.
pub fn input_hint(kind: FieldKind, options: &[String]) -> Option<String> {
    match kind {
        FieldKind::Boolean => Some("(yes/no, y/n, true/false)".to_string()),
        FieldKind::Numeric => Some("(number)".to_string()),
        FieldKind::SingleSelect if !options.is_empty() => Some(format!("({})", options.join("/"))),
        FieldKind::MultiSelect if !options.is_empty() => {
            Some(format!("(comma-separated: {})", options.join(", ")))
        }
        _ => None,
    }
}
