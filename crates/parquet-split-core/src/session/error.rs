//! Error types and SNAFU context selectors for split sessions.
//!
//! Open-time failures and pull-time failures are deliberately separate enums:
//! an [`OpenError`] leaves the session unusable and the caller may retry the
//! whole split with a fresh session, while a [`ReadError`] mid-stream cannot
//! be resumed because the record sequence is forward-only. Selectors are
//! `pub(crate)` so sibling modules attach context without re-exporting them.

use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

use crate::predicate::carrier::PredicateCodecError;

/// Errors raised while opening a session against a split.
///
/// Any of these leaves the session unusable; `close()` must still be called
/// (and is always safe to call).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum OpenError {
    /// The split file could not be opened.
    #[snafu(display("Failed to open split file {path}: {source}"))]
    Io {
        /// Path of the file that could not be opened.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The file's footer could not be parsed by the underlying reader.
    #[snafu(display("Failed to read Parquet footer for {path}: {source}"))]
    Footer {
        /// Path of the file whose footer failed to parse.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The record reader could not be constructed over the split.
    #[snafu(display("Failed to build record reader for {path}: {source}"))]
    Reader {
        /// Path of the file the reader was built against.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The stored filter predicate bytes could not be rehydrated.
    #[snafu(display("Failed to rehydrate filter predicate: {source}"))]
    Predicate {
        /// Underlying predicate codec error.
        #[snafu(source, backtrace)]
        source: PredicateCodecError,
    },

    /// The filter predicate references a column the file does not have.
    #[snafu(display("Filter predicate references column {column} not present in the file"))]
    PredicateColumn {
        /// The referenced column name.
        column: String,
    },

    /// A declared field has no counterpart in the file, so the projection
    /// cannot be resolved.
    #[snafu(display("Declared field {column} can not be found in the file"))]
    FieldNotInFile {
        /// The declared field name that is missing.
        column: String,
    },

    /// Sessions are single-use; a session that was already opened or closed
    /// cannot be opened again.
    #[snafu(display("Split session can only be opened once; use a fresh session per split"))]
    SessionReused,
}

/// Errors raised while pulling records from an open session.
///
/// Decode failures are not retried internally; the stream is forward-only,
/// so restarting means reopening the whole split in a new session.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReadError {
    /// The underlying reader failed to decode the next batch (corrupt page,
    /// decompression failure, malformed data).
    #[snafu(display("Failed to decode records from split: {source}"))]
    Decode {
        /// Underlying decode error.
        source: ArrowError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The session is not open (never opened, failed to open, or closed).
    #[snafu(display("Split session is not open"))]
    NotOpen,

    /// A pull was attempted after the split ran out of records.
    #[snafu(display("Split is exhausted"))]
    Exhausted,

    /// A record accessor was asked for a field index outside the declaration.
    #[snafu(display("Field index {index} out of range for {num_fields} declared fields"))]
    FieldIndex {
        /// The requested field index.
        index: usize,
        /// Number of declared fields.
        num_fields: usize,
    },

    /// A projected column has a type the record accessors cannot represent.
    #[snafu(display("Column {column} has unsupported type {datatype} for record projection"))]
    UnsupportedColumnType {
        /// Name of the offending column.
        column: String,
        /// Arrow data type encountered for the column.
        datatype: DataType,
    },
}
