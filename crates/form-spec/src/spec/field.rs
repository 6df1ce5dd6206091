use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    ShortText,
    LongText,
    SingleSelect,
    MultiSelect,
    Boolean,
    Numeric,
}

impl FieldKind {
    /// Serialized label for the kind.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::ShortText => "short-text",
            FieldKind::LongText => "long-text",
            FieldKind::SingleSelect => "single-select",
            FieldKind::MultiSelect => "multi-select",
            FieldKind::Boolean => "boolean",
            FieldKind::Numeric => "numeric",
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, FieldKind::SingleSelect | FieldKind::MultiSelect)
    }
}

/// Declarative value checks applied after the required check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Shows a field only while an earlier field's answer is one of the
/// allowed values. An unset controlling answer never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VisibilityRule {
    pub depends_on: String,
    pub allowed_values: BTreeSet<String>,
}

/// Caller-supplied validation hook, run after the built-in checks.
/// Returns an error message, or `None` when the value is acceptable.
/// Not part of the serialized catalogue.
#[derive(Clone)]
pub struct FieldValidator(Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>);

impl FieldValidator {
    pub fn new(check: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    pub fn check(&self, value: &Value) -> Option<String> {
        (self.0)(value)
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("FieldValidator")
    }
}

impl PartialEq for FieldValidator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A single entry in the field catalogue. Static for the lifetime of one
/// form session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub id: String,
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Ordered choice list, required for select kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(skip)]
    #[schemars(skip)]
    pub validator: Option<FieldValidator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_rule: Option<VisibilityRule>,
}

impl FieldSpec {
    /// Minimal field with the given id and kind; everything else defaulted.
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind,
            placeholder: None,
            help_text: None,
            required: false,
            options: None,
            constraint: None,
            validator: None,
            visibility_rule: None,
        }
    }
}
