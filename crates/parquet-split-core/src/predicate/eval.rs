//! Predicate evaluation against decoded record batches.
//!
//! This is the closure body of the row filter handed to the external reader:
//! it receives a batch containing only the predicate's columns and must
//! produce a boolean keep-mask. Comparisons use Arrow's compute kernels with
//! a 1-element scalar for the literal side, which broadcasts across the
//! batch without materializing a full-length constant column. Null
//! comparison results are folded to "drop row" before the mask is returned,
//! so SQL-style null semantics hold end to end.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Float32Array, Float64Array, Int32Array,
    Int64Array, Scalar, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::compute::kernels::{boolean, cmp};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use snafu::prelude::*;

use crate::predicate::{CompareOp, Predicate};
use crate::record::Value;

/// Errors raised while evaluating a predicate against a batch.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PredicateEvalError {
    /// The predicate references a column the batch does not carry.
    #[snafu(display("Predicate references column {column} not present in the record batch"))]
    UnknownColumn {
        /// The referenced column name.
        column: String,
    },

    /// The literal's kind cannot be compared against the column's type.
    #[snafu(display(
        "Predicate literal of kind {literal} can not be compared with column {column} of type {datatype}"
    ))]
    LiteralType {
        /// The column being compared.
        column: String,
        /// The column's Arrow data type.
        datatype: DataType,
        /// Kind of the offending literal.
        literal: String,
    },

    /// An Arrow compute kernel failed.
    #[snafu(display("Arrow error while evaluating predicate: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

/// Evaluates `predicate` over `batch` and returns a null-free keep-mask.
pub(crate) fn evaluate_mask(
    predicate: &Predicate,
    batch: &RecordBatch,
) -> Result<BooleanArray, PredicateEvalError> {
    let mask = evaluate(predicate, batch)?;
    Ok(drop_null_results(mask))
}

/// Rows whose comparison result is null must not be kept; fold the validity
/// into the values so downstream selection sees plain `false`.
fn drop_null_results(mask: BooleanArray) -> BooleanArray {
    match mask.nulls() {
        Some(nulls) => {
            let values = mask.values() & nulls.inner();
            BooleanArray::new(values, None)
        }
        None => mask,
    }
}

fn evaluate(predicate: &Predicate, batch: &RecordBatch) -> Result<BooleanArray, PredicateEvalError> {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let array = column_by_name(batch, column)?;
            let literal = literal_array(column, array.data_type(), value)?;
            let literal = Scalar::new(literal);
            let result = match op {
                CompareOp::Eq => cmp::eq(array, &literal),
                CompareOp::NotEq => cmp::neq(array, &literal),
                CompareOp::Lt => cmp::lt(array, &literal),
                CompareOp::LtEq => cmp::lt_eq(array, &literal),
                CompareOp::Gt => cmp::gt(array, &literal),
                CompareOp::GtEq => cmp::gt_eq(array, &literal),
            };
            result.context(ArrowSnafu)
        }
        Predicate::IsNull { column } => {
            boolean::is_null(column_by_name(batch, column)?.as_ref()).context(ArrowSnafu)
        }
        Predicate::IsNotNull { column } => {
            boolean::is_not_null(column_by_name(batch, column)?.as_ref()).context(ArrowSnafu)
        }
        Predicate::And(a, b) => {
            let left = evaluate(a, batch)?;
            let right = evaluate(b, batch)?;
            boolean::and(&left, &right).context(ArrowSnafu)
        }
        Predicate::Or(a, b) => {
            let left = evaluate(a, batch)?;
            let right = evaluate(b, batch)?;
            boolean::or(&left, &right).context(ArrowSnafu)
        }
        Predicate::Not(inner) => {
            let mask = evaluate(inner, batch)?;
            boolean::not(&mask).context(ArrowSnafu)
        }
    }
}

fn column_by_name<'a>(
    batch: &'a RecordBatch,
    column: &str,
) -> Result<&'a ArrayRef, PredicateEvalError> {
    let index = batch
        .schema()
        .index_of(column)
        .map_err(|_| PredicateEvalError::UnknownColumn {
            column: column.to_string(),
        })?;
    Ok(batch.column(index))
}

/// Builds a 1-element array holding `value`, typed to match the column so the
/// comparison kernels accept both operands.
fn literal_array(
    column: &str,
    datatype: &DataType,
    value: &Value,
) -> Result<ArrayRef, PredicateEvalError> {
    let array: ArrayRef = match (datatype, value) {
        (DataType::Boolean, Value::Bool(v)) => Arc::new(BooleanArray::from(vec![*v])),
        (DataType::Int32, Value::Int32(v)) => Arc::new(Int32Array::from(vec![*v])),
        (DataType::Int64, Value::Int64(v)) => Arc::new(Int64Array::from(vec![*v])),
        (DataType::Int64, Value::Int32(v)) => Arc::new(Int64Array::from(vec![i64::from(*v)])),
        (DataType::Float32, Value::Float32(v)) => Arc::new(Float32Array::from(vec![*v])),
        (DataType::Float64, Value::Float64(v)) => Arc::new(Float64Array::from(vec![*v])),
        (DataType::Utf8, Value::Utf8(v)) => Arc::new(StringArray::from(vec![v.as_str()])),
        (DataType::Binary, Value::Binary(v)) => Arc::new(BinaryArray::from(vec![v.as_slice()])),
        (DataType::Timestamp(unit, tz), Value::Int64(v)) => timestamp_scalar(unit, tz, *v),
        (
            DataType::Timestamp(unit, tz),
            Value::Timestamp {
                unit: literal_unit,
                value,
            },
        ) if *unit == literal_unit.to_arrow_time_unit() => timestamp_scalar(unit, tz, *value),
        _ => {
            return LiteralTypeSnafu {
                column,
                datatype: datatype.clone(),
                literal: value.type_name(),
            }
            .fail();
        }
    };
    Ok(array)
}

fn timestamp_scalar(unit: &TimeUnit, tz: &Option<Arc<str>>, value: i64) -> ArrayRef {
    // The scalar must carry the column's timezone, or the kernels reject the
    // operand pair as differently typed.
    match unit {
        TimeUnit::Second => {
            Arc::new(TimestampSecondArray::from(vec![value]).with_timezone_opt(tz.clone()))
        }
        TimeUnit::Millisecond => {
            Arc::new(TimestampMillisecondArray::from(vec![value]).with_timezone_opt(tz.clone()))
        }
        TimeUnit::Microsecond => {
            Arc::new(TimestampMicrosecondArray::from(vec![value]).with_timezone_opt(tz.clone()))
        }
        TimeUnit::Nanosecond => {
            Arc::new(TimestampNanosecondArray::from(vec![value]).with_timezone_opt(tz.clone()))
        }
    }
}
