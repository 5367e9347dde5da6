//! Physical schema extraction from Parquet footers.
//!
//! A [`PhysicalSchema`] is the field-name to type mapping recorded in one
//! file's own metadata, mapped into the adapter's logical type vocabulary.
//! Extraction reads a single footer through the external reader and is meant
//! to run once per file during planning, never per split: the read path
//! deliberately does not depend on it (see [`crate::schema::compat`]).
//!
//! Mapping prefers the column's logical annotation (`String`, `Timestamp`)
//! and falls back to the physical type. Physical types the adapter cannot
//! project (fixed-length byte arrays, INT96, nested groups) map to
//! [`LogicalType::Other`] rather than failing, so a file with exotic columns
//! can still be validated on the columns that matter.

use std::{collections::HashMap, path::Path};

use bytes::Bytes;
use parquet::basic::{LogicalType as ParquetLogicalType, TimeUnit, Type as PhysicalType};
use parquet::errors::ParquetError;
use parquet::file::reader::{FileReader, SerializedFileReader};
use snafu::{Backtrace, prelude::*};

use crate::schema::logical::{LogicalType, TimestampUnit};

fn map_column_type(physical: PhysicalType, logical: Option<&ParquetLogicalType>) -> LogicalType {
    // First: look at the logical annotation when present.
    if let Some(logical) = logical {
        match logical {
            ParquetLogicalType::String => {
                // Semantically a UTF-8 string, even though it's BYTE_ARRAY underneath.
                return LogicalType::Utf8;
            }
            ParquetLogicalType::Timestamp {
                is_adjusted_to_u_t_c: _,
                unit,
            } => {
                let unit = match unit {
                    TimeUnit::MILLIS(_) => TimestampUnit::Millis,
                    TimeUnit::MICROS(_) => TimestampUnit::Micros,
                    TimeUnit::NANOS(_) => TimestampUnit::Nanos,
                };
                return LogicalType::Timestamp { unit };
            }
            ParquetLogicalType::Map
            | ParquetLogicalType::List
            | ParquetLogicalType::Enum
            | ParquetLogicalType::Decimal { .. }
            | ParquetLogicalType::Uuid
            | ParquetLogicalType::Float16 => {
                return LogicalType::Other(format!("parquet::{logical:?}"));
            }
            _ => {}
        }
    }

    // Second: fall back to the physical type.
    match physical {
        PhysicalType::BOOLEAN => LogicalType::Bool,
        PhysicalType::INT32 => LogicalType::Int32,
        PhysicalType::INT64 => LogicalType::Int64,
        PhysicalType::FLOAT => LogicalType::Float32,
        PhysicalType::DOUBLE => LogicalType::Float64,
        PhysicalType::BYTE_ARRAY => LogicalType::Binary,
        PhysicalType::FIXED_LEN_BYTE_ARRAY | PhysicalType::INT96 => {
            LogicalType::Other(format!("parquet::{physical:?}"))
        }
    }
}

/// Field-name to type mapping recorded in one file's footer.
///
/// Read-only and scoped to one validation call; nothing in the read path
/// retains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalSchema {
    fields: HashMap<String, LogicalType>,
}

impl PhysicalSchema {
    /// Builds a physical schema from explicit `(name, type)` pairs.
    ///
    /// Useful when the surrounding engine already holds footer metadata and
    /// only wants the compatibility check.
    pub fn from_fields(fields: impl IntoIterator<Item = (String, LogicalType)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Builds a physical schema from in-memory Parquet file bytes.
    ///
    /// The caller supplies `path` for error context only.
    pub fn from_bytes(path: &Path, data: Bytes) -> Result<Self, PhysicalSchemaError> {
        let path_str = path.display().to_string();

        let reader =
            SerializedFileReader::new(data).map_err(|source| PhysicalSchemaError::Footer {
                path: path_str,
                source,
                backtrace: Backtrace::capture(),
            })?;

        let descr = reader.metadata().file_metadata().schema_descr();
        let mut fields = HashMap::with_capacity(descr.num_columns());
        for col in descr.columns() {
            let name = col.path().string();
            let physical = col.physical_type();
            let logical = col.logical_type();
            fields.insert(name, map_column_type(physical, logical.as_ref()));
        }

        Ok(Self { fields })
    }

    /// Reads the Parquet file at `path` and builds its physical schema.
    pub fn from_path(path: &Path) -> Result<Self, PhysicalSchemaError> {
        let data = std::fs::read(path).context(IoSnafu {
            path: path.display().to_string(),
        })?;
        Self::from_bytes(path, Bytes::from(data))
    }

    /// Type recorded for `name`, if the file has such a column.
    pub fn get(&self, name: &str) -> Option<&LogicalType> {
        self.fields.get(name)
    }

    /// Number of physical columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the file declares no columns at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Errors raised while deriving a physical schema from a file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PhysicalSchemaError {
    /// Reading the file from disk failed.
    #[snafu(display("Failed to read Parquet file {path}: {source}"))]
    Io {
        /// Path of the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Parsing the Parquet footer failed.
    #[snafu(display("Failed to parse Parquet footer for {path}: {source}"))]
    Footer {
        /// Path of the file whose footer could not be parsed.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}
