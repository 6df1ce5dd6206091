use std::collections::BTreeMap;
use std::fmt;

use crate::spec::field::FieldSpec;

/// Catalogue authoring problems. None of these are fatal: the visibility
/// resolver keeps the affected field hidden instead of crashing, and the
/// catalogue author fixes the definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueWarning {
    DuplicateId {
        field_id: String,
    },
    /// `depends_on` names a field that does not exist in the catalogue.
    UnknownDependency {
        field_id: String,
        depends_on: String,
    },
    /// `depends_on` names the field itself or a later field; visibility
    /// rules may only look backwards.
    ForwardDependency {
        field_id: String,
        depends_on: String,
    },
    /// A select field with no options can never hold a valid answer.
    MissingOptions {
        field_id: String,
    },
}

impl fmt::Display for CatalogueWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogueWarning::DuplicateId { field_id } => {
                write!(formatter, "duplicate field id '{field_id}'")
            }
            CatalogueWarning::UnknownDependency {
                field_id,
                depends_on,
            } => write!(
                formatter,
                "field '{field_id}' depends on unknown field '{depends_on}'"
            ),
            CatalogueWarning::ForwardDependency {
                field_id,
                depends_on,
            } => write!(
                formatter,
                "field '{field_id}' depends on '{depends_on}', which is not an earlier field"
            ),
            CatalogueWarning::MissingOptions { field_id } => {
                write!(formatter, "select field '{field_id}' has no options")
            }
        }
    }
}

/// Scans a catalogue for authoring mistakes.
pub fn catalogue_warnings(fields: &[FieldSpec]) -> Vec<CatalogueWarning> {
    let mut first_position: BTreeMap<&str, usize> = BTreeMap::new();
    for (index, field) in fields.iter().enumerate() {
        first_position.entry(field.id.as_str()).or_insert(index);
    }

    let mut warnings = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        if first_position.get(field.id.as_str()) != Some(&index) {
            warnings.push(CatalogueWarning::DuplicateId {
                field_id: field.id.clone(),
            });
        }

        if field.kind.is_select()
            && field
                .options
                .as_ref()
                .map(|options| options.is_empty())
                .unwrap_or(true)
        {
            warnings.push(CatalogueWarning::MissingOptions {
                field_id: field.id.clone(),
            });
        }

        if let Some(rule) = &field.visibility_rule {
            match first_position.get(rule.depends_on.as_str()) {
                None => warnings.push(CatalogueWarning::UnknownDependency {
                    field_id: field.id.clone(),
                    depends_on: rule.depends_on.clone(),
                }),
                Some(&position) if position >= index => {
                    warnings.push(CatalogueWarning::ForwardDependency {
                        field_id: field.id.clone(),
                        depends_on: rule.depends_on.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    warnings
}

/// Runs the lint and emits each finding through `tracing`.
pub fn report_catalogue_warnings(fields: &[FieldSpec]) -> Vec<CatalogueWarning> {
    let warnings = catalogue_warnings(fields);
    for warning in &warnings {
        tracing::warn!(%warning, "catalogue inconsistency");
    }
    warnings
}
