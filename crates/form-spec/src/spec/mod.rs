pub mod catalogue;
pub mod field;

pub use catalogue::Catalogue;
pub use field::{Constraint, FieldKind, FieldSpec, FieldValidator, VisibilityRule};
