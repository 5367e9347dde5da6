//! Wrapper prelude.
//!
//! The `parquet-split-input` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::{
    CompareOp, DeclaredFields, FieldSpec, FileSplit, LogicalType, OpenError, ParquetSplitSource,
    PhysicalSchema, Predicate, ReadError, ReadOptions, RecordBridge, RecordConverter, RowView,
    SchemaMismatch, SplitSession, TimestampUnit, Value, ValueRowConverter,
};
