//! The split-reading source: declared fields, options, and predicate wiring.
//!
//! A [`ParquetSplitSource`] is the long-lived adapter object the engine
//! constructs once per scan: it owns the declared field sequence for its
//! whole lifetime, carries the (optional) serialized filter predicate, and
//! mints one [`SplitSession`] per assigned split. It also exposes the
//! advisory schema compatibility check, which the engine may run once per
//! file during planning, never implicitly per split.

use std::sync::Arc;

use bytes::Bytes;

use crate::predicate::Predicate;
use crate::predicate::carrier::{PredicateCarrier, PredicateCodecError};
use crate::schema::compat::{SchemaMismatch, check_declared_fields};
use crate::schema::logical::DeclaredFields;
use crate::schema::physical::PhysicalSchema;
use crate::session::{ReadOptions, SplitSession};

/// Long-lived read source over one declared field sequence.
#[derive(Debug, Clone)]
pub struct ParquetSplitSource {
    fields: Arc<DeclaredFields>,
    options: ReadOptions,
    carrier: PredicateCarrier,
}

impl ParquetSplitSource {
    /// Creates a source reading the given declared fields with default
    /// options.
    pub fn new(fields: DeclaredFields) -> Self {
        Self::with_options(fields, ReadOptions::default())
    }

    /// Creates a source with explicit read options.
    pub fn with_options(fields: DeclaredFields, options: ReadOptions) -> Self {
        Self {
            fields: Arc::new(fields),
            options,
            carrier: PredicateCarrier::new(),
        }
    }

    /// The declared field sequence this source projects.
    pub fn fields(&self) -> &DeclaredFields {
        &self.fields
    }

    /// Stores the filter predicate in serialized form, or clears it.
    ///
    /// Supply the predicate at most once, before any split is opened;
    /// sessions already minted keep the carrier contents they were created
    /// with.
    pub fn set_predicate(
        &mut self,
        predicate: Option<&Predicate>,
    ) -> Result<(), PredicateCodecError> {
        self.carrier.set(predicate)
    }

    /// The serialized predicate bytes, for shipping to another execution
    /// context.
    pub fn predicate_bytes(&self) -> Option<&Bytes> {
        self.carrier.bytes()
    }

    /// Installs predicate bytes received from the planning side.
    pub fn set_predicate_bytes(&mut self, bytes: Bytes) {
        self.carrier = PredicateCarrier::from_bytes(bytes);
    }

    /// Mints a fresh, unopened session for one split.
    ///
    /// Each session receives its own handle on the predicate bytes and
    /// rehydrates its own predicate instance at open time; no state is
    /// shared between sessions.
    pub fn session(&self) -> SplitSession {
        SplitSession::new(
            Arc::clone(&self.fields),
            self.carrier.clone(),
            self.options.clone(),
        )
    }

    /// Checks the declared fields against a file's physical schema.
    ///
    /// Advisory and side-effect free; the read path never calls this. Run it
    /// once per file during planning if early schema failures are wanted.
    pub fn check_schema(&self, physical: &PhysicalSchema) -> Result<(), SchemaMismatch> {
        check_declared_fields(&self.fields, physical)
    }
}
