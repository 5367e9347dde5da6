//! Record values and the borrowed row view.
//!
//! The reader decodes into batches it owns and reuses; a [`RowView`] is a
//! borrowed window onto one row of the current batch. The borrow ends at the
//! next pull, so consumers cannot retain a view: they must copy the field
//! values they need into their own storage first, which is exactly the
//! contract [`crate::bridge`] enforces for converters.

use std::fmt;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Float32Array, Float64Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::schema::logical::{DeclaredFields, FieldSpec, TimestampUnit};
use crate::session::error::ReadError;

/// An owned scalar value: one cell of a projected record, or one literal in a
/// filter predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Variable-length binary data.
    Binary(Vec<u8>),
    /// Timestamp as an integer count of `unit` ticks since the Unix epoch.
    Timestamp {
        /// Precision unit of `value`.
        unit: TimestampUnit,
        /// Tick count since the Unix epoch.
        value: i64,
    },
}

impl Value {
    /// Whether this value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's kind, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Utf8(_) => "utf8",
            Value::Binary(_) => "binary",
            Value::Timestamp { .. } => "timestamp",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Utf8(v) => write!(f, "{v}"),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp { unit, value } => write!(f, "{value}{unit}"),
        }
    }
}

/// A borrowed view onto one row of the reader's current batch.
///
/// Field indices follow the declared field order, not the file's column
/// order. The view is only valid until the session's next pull; copy values
/// out with [`RowView::value`] before advancing.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    fields: &'a DeclaredFields,
    batch: &'a RecordBatch,
    columns: &'a [usize],
    row: usize,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(
        fields: &'a DeclaredFields,
        batch: &'a RecordBatch,
        columns: &'a [usize],
        row: usize,
    ) -> Self {
        Self {
            fields,
            batch,
            columns,
            row,
        }
    }

    /// Number of fields in the row (the declared field count).
    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    /// Declared spec of the field at `index`, if any.
    pub fn field(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    /// Copies the value of the field at `index` (declared order) out of the
    /// underlying batch.
    pub fn value(&self, index: usize) -> Result<Value, ReadError> {
        let column_index = *self
            .columns
            .get(index)
            .ok_or(ReadError::FieldIndex {
                index,
                num_fields: self.columns.len(),
            })?;
        let column = self.batch.column(column_index);
        if column.is_null(self.row) {
            return Ok(Value::Null);
        }

        let name = || match self.fields.get(index) {
            Some(spec) => spec.name.clone(),
            None => index.to_string(),
        };

        match column.data_type() {
            DataType::Boolean => Ok(Value::Bool(
                downcast::<BooleanArray>(column, name)?.value(self.row),
            )),
            DataType::Int32 => Ok(Value::Int32(
                downcast::<Int32Array>(column, name)?.value(self.row),
            )),
            DataType::Int64 => Ok(Value::Int64(
                downcast::<Int64Array>(column, name)?.value(self.row),
            )),
            DataType::Float32 => Ok(Value::Float32(
                downcast::<Float32Array>(column, name)?.value(self.row),
            )),
            DataType::Float64 => Ok(Value::Float64(
                downcast::<Float64Array>(column, name)?.value(self.row),
            )),
            DataType::Utf8 => Ok(Value::Utf8(
                downcast::<StringArray>(column, name)?.value(self.row).to_string(),
            )),
            DataType::Binary => Ok(Value::Binary(
                downcast::<BinaryArray>(column, name)?.value(self.row).to_vec(),
            )),
            DataType::Timestamp(TimeUnit::Millisecond, _) => Ok(Value::Timestamp {
                unit: TimestampUnit::Millis,
                value: downcast::<TimestampMillisecondArray>(column, name)?.value(self.row),
            }),
            DataType::Timestamp(TimeUnit::Microsecond, _) => Ok(Value::Timestamp {
                unit: TimestampUnit::Micros,
                value: downcast::<TimestampMicrosecondArray>(column, name)?.value(self.row),
            }),
            DataType::Timestamp(TimeUnit::Nanosecond, _) => Ok(Value::Timestamp {
                unit: TimestampUnit::Nanos,
                value: downcast::<TimestampNanosecondArray>(column, name)?.value(self.row),
            }),
            other => Err(ReadError::UnsupportedColumnType {
                column: name(),
                datatype: other.clone(),
            }),
        }
    }
}

fn downcast<T: 'static>(
    column: &ArrayRef,
    name: impl Fn() -> String,
) -> Result<&T, ReadError> {
    column
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ReadError::UnsupportedColumnType {
            column: name(),
            datatype: column.data_type().clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::logical::{FieldSpec, LogicalType};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("price", DataType::Float64, true),
            Field::new("id", DataType::Int64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
                Arc::new(Int64Array::from(vec![7, 8])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn values_follow_declared_order_not_batch_order() {
        let declared = DeclaredFields::new(vec![
            FieldSpec::new("id", LogicalType::Int64),
            FieldSpec::new("price", LogicalType::Float64),
        ])
        .unwrap();
        let batch = sample_batch();
        // Declared "id" first, but the batch stores it second.
        let columns = vec![1, 0];

        let row = RowView::new(&declared, &batch, &columns, 0);
        assert_eq!(row.num_fields(), 2);
        assert_eq!(row.value(0).unwrap(), Value::Int64(7));
        assert_eq!(row.value(1).unwrap(), Value::Float64(1.5));
    }

    #[test]
    fn null_cells_surface_as_null_values() {
        let declared =
            DeclaredFields::new(vec![FieldSpec::new("price", LogicalType::Float64)]).unwrap();
        let batch = sample_batch();
        let columns = vec![0];

        let row = RowView::new(&declared, &batch, &columns, 1);
        assert_eq!(row.value(0).unwrap(), Value::Null);
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let declared =
            DeclaredFields::new(vec![FieldSpec::new("price", LogicalType::Float64)]).unwrap();
        let batch = sample_batch();
        let columns = vec![0];

        let row = RowView::new(&declared, &batch, &columns, 0);
        let err = row.value(5).unwrap_err();
        assert!(
            matches!(err, ReadError::FieldIndex { index: 5, num_fields: 1 }),
            "unexpected error: {err:?}"
        );
    }
}
