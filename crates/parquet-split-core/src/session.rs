//! Per-split reader sessions.
//!
//! A [`SplitSession`] owns the external record reader and its file handle for
//! the lifetime of exactly one split: `Unopened → Open → Closed`, with
//! `Closed` reachable from every state. One session serves one split
//! sequentially; parallelism is many independent sessions in separate
//! execution contexts, each rehydrating its own predicate from the carrier
//! bytes.
//!
//! Opening resolves which row groups the split's byte range covers from the
//! session's own footer read. Splits are planned from file length alone, so
//! the assignment rule must partition a file's row groups across adjacent
//! splits without coordination: a row group belongs to the split that
//! contains its byte midpoint. Reading every footer up front instead would
//! serialize planning on a single process, which is the bottleneck this
//! layout exists to avoid; the cost moves to one footer read per opened
//! session, where it is paid in parallel.
//!
//! All pulls are synchronous and may block on storage. Failures are never
//! retried internally: an open failure permits (and requires) a `close()`,
//! and a decode failure mid-stream means the caller restarts the whole split
//! in a fresh session, because the record sequence is forward-only.

pub mod error;

use std::fs::File;
use std::sync::Arc;

use arrow::array::RecordBatchReader;
use arrow::record_batch::RecordBatch;
use log::debug;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{
    ArrowPredicateFn, ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder, RowFilter,
};
use parquet::file::metadata::RowGroupMetaData;
use snafu::prelude::*;

use crate::predicate::carrier::PredicateCarrier;
use crate::predicate::eval::evaluate_mask;
use crate::record::RowView;
use crate::schema::logical::DeclaredFields;
use crate::session::error::{
    DecodeSnafu, ExhaustedSnafu, FieldNotInFileSnafu, FooterSnafu, IoSnafu, NotOpenSnafu,
    OpenError, PredicateColumnSnafu, PredicateSnafu, ReadError, ReaderSnafu, SessionReusedSnafu,
};
use crate::split::FileSplit;

/// Default number of rows per decoded batch.
const DEFAULT_BATCH_SIZE: usize = 8192;

/// Tuning knobs for split sessions.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    batch_size: usize,
}

impl ReadOptions {
    /// Options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of rows the reader decodes per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Number of rows the reader decodes per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Select the row groups whose byte midpoint falls inside `[start, end)`.
///
/// Row groups are laid out sequentially after the 4-byte magic, so their
/// offsets are recovered by walking compressed sizes. Midpoint assignment
/// gives every row group exactly one owning split, whatever the split
/// boundaries, as long as the splits themselves partition the file.
fn row_groups_in_range(row_groups: &[RowGroupMetaData], start: u64, end: u64) -> Vec<usize> {
    let mut selected = Vec::new();
    let mut offset = 4u64;

    for (index, row_group) in row_groups.iter().enumerate() {
        let size = row_group.compressed_size() as u64;
        let midpoint = offset + size / 2;
        if start <= midpoint && midpoint < end {
            selected.push(index);
        }
        offset += size;
    }

    selected
}

struct OpenState {
    reader: ParquetRecordBatchReader,
    /// Declared field index → column index in decoded batches.
    column_map: Vec<usize>,
    /// Rows covered by the selected row groups, before any filtering.
    rows_in_split: u64,
    batch: Option<RecordBatch>,
    cursor: usize,
    finished: bool,
}

enum SessionState {
    Unopened,
    Open(Box<OpenState>),
    Closed,
}

/// Reader session bound to one split of one file.
///
/// Created through [`crate::source::ParquetSplitSource::session`]. Dropping
/// the session releases the reader and file handle; [`SplitSession::close`]
/// does the same explicitly and is idempotent from any state.
pub struct SplitSession {
    fields: Arc<DeclaredFields>,
    carrier: PredicateCarrier,
    options: ReadOptions,
    state: SessionState,
}

impl SplitSession {
    pub(crate) fn new(
        fields: Arc<DeclaredFields>,
        carrier: PredicateCarrier,
        options: ReadOptions,
    ) -> Self {
        Self {
            fields,
            carrier,
            options,
            state: SessionState::Unopened,
        }
    }

    /// Opens the session against `split`.
    ///
    /// Builds a reader restricted to the split's row groups, projected onto
    /// the declared fields, with the carrier's predicate (if any) installed
    /// as a row filter. On failure the session becomes unusable; `close()`
    /// is still safe and a fresh session may retry the same split.
    pub fn open(&mut self, split: &FileSplit) -> Result<(), OpenError> {
        if !matches!(self.state, SessionState::Unopened) {
            return SessionReusedSnafu.fail();
        }

        match self.build_reader(split) {
            Ok(open) => {
                self.state = SessionState::Open(Box::new(open));
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Closed;
                Err(err)
            }
        }
    }

    fn build_reader(&self, split: &FileSplit) -> Result<OpenState, OpenError> {
        let path = split.path().display().to_string();

        let file = File::open(split.path()).context(IoSnafu {
            path: path.as_str(),
        })?;
        let mut builder = ParquetRecordBatchReaderBuilder::try_new(file).context(FooterSnafu {
            path: path.as_str(),
        })?;

        let row_groups =
            row_groups_in_range(builder.metadata().row_groups(), split.start(), split.end());
        let rows_in_split: u64 = row_groups
            .iter()
            .map(|&index| builder.metadata().row_group(index).num_rows() as u64)
            .sum();
        debug!(
            "opening split {}[{}..{}): {} of {} row groups, {} rows",
            path,
            split.start(),
            split.end(),
            row_groups.len(),
            builder.metadata().num_row_groups(),
            rows_in_split,
        );

        // The full file schema, used to resolve names before projection.
        let file_schema = builder.schema().clone();

        if let Some(predicate) = self.carrier.get().context(PredicateSnafu)? {
            let mut filter_roots = Vec::new();
            for column in predicate.referenced_columns() {
                match file_schema.index_of(column) {
                    Ok(index) => filter_roots.push(index),
                    Err(_) => return PredicateColumnSnafu { column }.fail(),
                }
            }
            let mask = ProjectionMask::roots(builder.parquet_schema(), filter_roots);
            let filter = ArrowPredicateFn::new(mask, move |batch| {
                evaluate_mask(&predicate, &batch)
                    .map_err(|err| arrow::error::ArrowError::ExternalError(Box::new(err)))
            });
            builder = builder.with_row_filter(RowFilter::new(vec![Box::new(filter)]));
        }

        let mut projection_roots = Vec::with_capacity(self.fields.len());
        for field in self.fields.iter() {
            match file_schema.index_of(&field.name) {
                Ok(index) => projection_roots.push(index),
                Err(_) => {
                    return FieldNotInFileSnafu {
                        column: field.name.as_str(),
                    }
                    .fail();
                }
            }
        }
        let projection = ProjectionMask::roots(builder.parquet_schema(), projection_roots);

        let reader = builder
            .with_row_groups(row_groups)
            .with_projection(projection)
            .with_batch_size(self.options.batch_size())
            .build()
            .context(ReaderSnafu {
                path: path.as_str(),
            })?;

        // Decoded batches keep the file's column order; map the declared
        // order onto it.
        let projected_schema = reader.schema();
        let mut column_map = Vec::with_capacity(self.fields.len());
        for field in self.fields.iter() {
            match projected_schema.index_of(&field.name) {
                Ok(index) => column_map.push(index),
                Err(_) => {
                    return FieldNotInFileSnafu {
                        column: field.name.as_str(),
                    }
                    .fail();
                }
            }
        }

        Ok(OpenState {
            reader,
            column_map,
            rows_in_split,
            batch: None,
            cursor: 0,
            finished: false,
        })
    }

    /// Whether a subsequent [`SplitSession::next`] will yield a record.
    ///
    /// Pulls the next batch from the reader when the current one is drained
    /// and caches it, so repeated calls have no effect beyond the reader's
    /// own look-ahead.
    pub fn has_more(&mut self) -> Result<bool, ReadError> {
        let SessionState::Open(open) = &mut self.state else {
            return NotOpenSnafu.fail();
        };

        loop {
            if let Some(batch) = &open.batch {
                if open.cursor < batch.num_rows() {
                    return Ok(true);
                }
            }
            if open.finished {
                return Ok(false);
            }
            match open.reader.next() {
                Some(Ok(batch)) => {
                    open.batch = Some(batch);
                    open.cursor = 0;
                }
                Some(Err(source)) => return Err(source).context(DecodeSnafu),
                None => {
                    open.batch = None;
                    open.finished = true;
                    return Ok(false);
                }
            }
        }
    }

    /// Yields the next record as a borrowed [`RowView`] and advances.
    ///
    /// The view is only valid until the next pull; copy needed values out
    /// first. Pulling past the end is [`ReadError::Exhausted`].
    pub fn next(&mut self) -> Result<RowView<'_>, ReadError> {
        if !self.has_more()? {
            return ExhaustedSnafu.fail();
        }

        let SessionState::Open(open) = &mut self.state else {
            return NotOpenSnafu.fail();
        };
        let Some(batch) = open.batch.as_ref() else {
            return ExhaustedSnafu.fail();
        };

        let row = open.cursor;
        open.cursor += 1;
        Ok(RowView::new(&self.fields, batch, &open.column_map, row))
    }

    /// Rows covered by the split's row groups before filtering, when open.
    pub fn rows_in_split(&self) -> Option<u64> {
        match &self.state {
            SessionState::Open(open) => Some(open.rows_in_split),
            _ => None,
        }
    }

    /// Releases the reader and its file handle.
    ///
    /// Idempotent: closing twice, or closing a session that was never
    /// opened or that failed to open, is a no-op.
    pub fn close(&mut self) {
        if matches!(self.state, SessionState::Open(_)) {
            debug!("closing split session");
        }
        self.state = SessionState::Closed;
    }
}
