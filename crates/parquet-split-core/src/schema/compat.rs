//! Schema compatibility checks (pure metadata).
//!
//! Verifies that every declared field exists in a file's physical schema with
//! an exactly matching type. The check is advisory: it is exposed for the
//! surrounding engine to run once per file during planning and is never
//! invoked by the split read path, which would otherwise pay a footer
//! inspection per split. Extra physical columns are ignored; only the
//! declared sequence is checked.

use snafu::prelude::*;

use crate::schema::logical::{DeclaredFields, LogicalType};
use crate::schema::physical::PhysicalSchema;

/// Errors raised when a declared field is not compatible with a file.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SchemaMismatch {
    /// The file has no column with the declared name.
    #[snafu(display("Declared field {column} can not be found in the file schema"))]
    FieldNotFound {
        /// The declared field name that is missing.
        column: String,
    },

    /// The column exists but its type differs from the declaration.
    #[snafu(display(
        "Field {column} has physical type {actual} which can not be read as declared {declared}"
    ))]
    TypeMismatch {
        /// The field name with mismatched types.
        column: String,
        /// The declared logical type.
        declared: LogicalType,
        /// The type recorded in the file.
        actual: LogicalType,
    },
}

/// A convenience type alias for results of schema compatibility checks.
pub type SchemaResult<T> = Result<T, SchemaMismatch>;

/// Checks every declared field against the file's physical schema.
///
/// Succeeds iff each declared name exists and its physical type maps to a
/// type equal to the declared one. Fails on the first offending field, in
/// declared order.
pub fn check_declared_fields(
    declared: &DeclaredFields,
    physical: &PhysicalSchema,
) -> SchemaResult<()> {
    for field in declared.iter() {
        let actual = physical
            .get(&field.name)
            .ok_or_else(|| SchemaMismatch::FieldNotFound {
                column: field.name.clone(),
            })?;

        if *actual != field.data_type {
            return TypeMismatchSnafu {
                column: field.name.clone(),
                declared: field.data_type.clone(),
                actual: actual.clone(),
            }
            .fail();
        }
    }

    Ok(())
}
