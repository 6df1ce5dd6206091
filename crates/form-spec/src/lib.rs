#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod lint;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerSet, ValidationError, ValidationResult};
pub use answers_schema::generate as answers_schema;
pub use lint::{CatalogueWarning, catalogue_warnings, report_catalogue_warnings};
pub use spec::{Catalogue, Constraint, FieldKind, FieldSpec, FieldValidator, VisibilityRule};
pub use validate::{REQUIRED_MESSAGE, is_empty_value, validate, validate_field};
pub use visibility::{VisibilityMap, resolve_visibility, visible_fields};
