//! Declared logical fields and data types.
//!
//! The engine declares the fields it wants to read as an ordered sequence of
//! `(name, logical type)` pairs. The declared order defines the layout of
//! every output record; the on-disk column order never leaks through. The
//! sequence is validated once at construction and owned by the source for its
//! whole lifetime.

use std::{collections::HashSet, fmt, sync::Arc};

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Units for logical timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimestampUnit {
    /// Millisecond precision timestamps.
    Millis,
    /// Microsecond precision timestamps.
    Micros,
    /// Nanosecond precision timestamps.
    Nanos,
}

impl TimestampUnit {
    pub(crate) fn to_arrow_time_unit(self) -> TimeUnit {
        match self {
            TimestampUnit::Millis => TimeUnit::Millisecond,
            TimestampUnit::Micros => TimeUnit::Microsecond,
            TimestampUnit::Nanos => TimeUnit::Nanosecond,
        }
    }
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampUnit::Millis => write!(f, "ms"),
            TimestampUnit::Micros => write!(f, "us"),
            TimestampUnit::Nanos => write!(f, "ns"),
        }
    }
}

/// Engine-facing logical data types, independent of on-disk encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicalType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 encoded string.
    Utf8,
    /// Variable-length binary data.
    Binary,
    /// Timestamp value with a precision unit.
    Timestamp {
        /// Timestamp precision unit (millis, micros, nanos).
        unit: TimestampUnit,
    },
    /// Catch-all for physical types this adapter does not project, referenced
    /// by name. Produced only when mapping a file's physical schema; declaring
    /// a field with an `Other` type always fails compatibility checks.
    Other(String),
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Bool => write!(f, "bool"),
            LogicalType::Int32 => write!(f, "int32"),
            LogicalType::Int64 => write!(f, "int64"),
            LogicalType::Float32 => write!(f, "float32"),
            LogicalType::Float64 => write!(f, "float64"),
            LogicalType::Utf8 => write!(f, "utf8"),
            LogicalType::Binary => write!(f, "binary"),
            LogicalType::Timestamp { unit } => write!(f, "timestamp[{unit}]"),
            LogicalType::Other(s) => write!(f, "{s}"),
        }
    }
}

impl LogicalType {
    fn to_arrow_datatype(&self, column: &str) -> Result<DataType, SchemaConvertError> {
        Ok(match self {
            LogicalType::Bool => DataType::Boolean,
            LogicalType::Int32 => DataType::Int32,
            LogicalType::Int64 => DataType::Int64,
            LogicalType::Float32 => DataType::Float32,
            LogicalType::Float64 => DataType::Float64,
            LogicalType::Utf8 => DataType::Utf8,
            LogicalType::Binary => DataType::Binary,
            LogicalType::Timestamp { unit } => {
                DataType::Timestamp(unit.to_arrow_time_unit(), None)
            }
            LogicalType::Other(name) => {
                return OpaqueTypeSnafu {
                    column,
                    name: name.clone(),
                }
                .fail();
            }
        })
    }
}

/// Declared field: a name plus the logical type the engine expects for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, matched against the file's physical columns.
    pub name: String,
    /// Declared logical type for the field.
    pub data_type: LogicalType,
}

impl FieldSpec {
    /// Creates a field spec.
    pub fn new(name: impl Into<String>, data_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.data_type)
    }
}

/// The ordered, validated sequence of declared fields.
///
/// Field names must be unique and the sequence non-empty. The order here is
/// the order of values in every projected output record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeclaredFields {
    fields: Vec<FieldSpec>,
}

impl DeclaredFields {
    /// Validates and wraps a field sequence.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, DeclaredFieldsError> {
        ensure!(!fields.is_empty(), EmptySnafu);

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            ensure!(
                seen.insert(field.name.as_str()),
                DuplicateFieldSnafu {
                    column: field.name.clone(),
                }
            );
        }

        Ok(Self { fields })
    }

    /// Number of declared fields (always at least one).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Field spec at position `index`, if any.
    pub fn get(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    /// Iterates the declared fields in output order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    /// Convert the declared fields to an owned Arrow [`Schema`].
    ///
    /// All fields are marked nullable: nullability is a property of the file,
    /// not of the declaration, and projected values surface missing data as
    /// nulls. Fails if any field uses an opaque [`LogicalType::Other`] type.
    pub fn to_arrow_schema(&self) -> Result<Schema, SchemaConvertError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in &self.fields {
            let dt = spec.data_type.to_arrow_datatype(&spec.name)?;
            fields.push(Field::new(spec.name.clone(), dt, true));
        }
        Ok(Schema::new(fields))
    }

    /// Convert the declared fields to a shared Arrow [`SchemaRef`].
    pub fn to_arrow_schema_ref(&self) -> Result<SchemaRef, SchemaConvertError> {
        Ok(Arc::new(self.to_arrow_schema()?))
    }
}

/// Errors raised when a declared field sequence is invalid.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum DeclaredFieldsError {
    /// At least one field must be declared.
    #[snafu(display("Field specs must declare at least one field"))]
    Empty,

    /// Duplicate field names are not allowed.
    #[snafu(display("Duplicate field name: {column}"))]
    DuplicateField {
        /// The duplicate field name.
        column: String,
    },
}

/// Errors raised when converting declared fields to an Arrow schema.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SchemaConvertError {
    /// Opaque types have no Arrow representation.
    #[snafu(display("Field {column} has opaque type {name} with no Arrow representation"))]
    OpaqueType {
        /// Field name that failed conversion.
        column: String,
        /// Name of the opaque type.
        name: String,
    },
}
