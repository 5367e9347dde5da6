//! Bridging the pull interface into the engine's iteration contract.
//!
//! Engines iterate with a reuse-oriented protocol: "are we done?" plus "fill
//! this caller-owned record with the next row". [`RecordBridge`] maps a
//! session's `has_more`/`next` pair onto that surface, and [`RecordConverter`]
//! is the extension point that defines the output shape. Converters receive
//! the borrowed [`RowView`] and must copy every needed value into the reused
//! output record; the view dies at the next pull, so handing it out is not
//! expressible.

use crate::record::{RowView, Value};
use crate::session::SplitSession;
use crate::session::error::{OpenError, ReadError};
use crate::split::FileSplit;

/// Converts the borrowed current row into a caller-owned output record.
///
/// Implementations define the target shape (tuple-like rows, structs, …) and
/// must copy values out of the view; retaining the view itself is prevented
/// by its lifetime.
pub trait RecordConverter {
    /// The caller-owned output record type.
    type Record;

    /// Fills `record` from `row`, replacing its previous contents.
    fn convert(&mut self, row: &RowView<'_>, record: &mut Self::Record) -> Result<(), ReadError>;
}

/// Adapts a [`SplitSession`] to the engine's reuse-oriented pull protocol.
pub struct RecordBridge<C: RecordConverter> {
    session: SplitSession,
    converter: C,
}

impl<C: RecordConverter> RecordBridge<C> {
    /// Wraps a session and a converter.
    pub fn new(session: SplitSession, converter: C) -> Self {
        Self { session, converter }
    }

    /// Opens the underlying session against `split`.
    pub fn open(&mut self, split: &FileSplit) -> Result<(), OpenError> {
        self.session.open(split)
    }

    /// Whether the split's record sequence is finished.
    pub fn reached_end(&mut self) -> Result<bool, ReadError> {
        Ok(!self.session.has_more()?)
    }

    /// Pulls the next row and converts it into `record`.
    ///
    /// Call only after [`RecordBridge::reached_end`] reported `false`.
    pub fn next_record(&mut self, record: &mut C::Record) -> Result<(), ReadError> {
        let row = self.session.next()?;
        self.converter.convert(&row, record)
    }

    /// Closes the underlying session. Idempotent.
    pub fn close(&mut self) {
        self.session.close();
    }
}

/// Reference converter producing generic rows: one [`Value`] per declared
/// field, in declared order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueRowConverter;

impl RecordConverter for ValueRowConverter {
    type Record = Vec<Value>;

    fn convert(&mut self, row: &RowView<'_>, record: &mut Self::Record) -> Result<(), ReadError> {
        record.clear();
        record.reserve(row.num_fields());
        for index in 0..row.num_fields() {
            record.push(row.value(index)?);
        }
        Ok(())
    }
}
