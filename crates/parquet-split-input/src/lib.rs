//! # parquet-split-input
//!
//! Byte-range split reading of Parquet files for batch engines.
//!
//! This crate is the supported public entry point and provides a small,
//! stable surface over `parquet-split-core`:
//!
//! - declare the fields to read ([`DeclaredFields`]), build a
//!   [`ParquetSplitSource`], optionally install a [`Predicate`];
//! - mint one [`SplitSession`] per externally planned [`FileSplit`] and pull
//!   records through it, or wrap it in a [`RecordBridge`] for reuse-oriented
//!   iteration;
//! - validate declared fields against a file's [`PhysicalSchema`] once per
//!   file with [`ParquetSplitSource::check_schema`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use parquet_split_input::prelude::*;
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

pub use parquet_split_core::bridge::{RecordBridge, RecordConverter, ValueRowConverter};
pub use parquet_split_core::predicate::{
    CompareOp, Predicate, PredicateCarrier, PredicateCodecError, PredicateEvalError,
};
pub use parquet_split_core::record::{RowView, Value};
pub use parquet_split_core::schema::compat::{SchemaMismatch, check_declared_fields};
pub use parquet_split_core::schema::logical::{
    DeclaredFields, DeclaredFieldsError, FieldSpec, LogicalType, SchemaConvertError,
    TimestampUnit,
};
pub use parquet_split_core::schema::physical::{PhysicalSchema, PhysicalSchemaError};
pub use parquet_split_core::session::error::{OpenError, ReadError};
pub use parquet_split_core::session::{ReadOptions, SplitSession};
pub use parquet_split_core::source::ParquetSplitSource;
pub use parquet_split_core::split::FileSplit;
