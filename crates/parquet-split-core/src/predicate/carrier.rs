//! Serialized transport for filter predicates.
//!
//! Execution contexts do not share memory with the planner, so the predicate
//! travels as a byte buffer and every session rehydrates its own instance.
//! [`PredicateCarrier::get`] decodes on every call rather than caching: a
//! cached instance would be shared state between sessions that the
//! concurrency model forbids, and decoding per open is cheap next to the
//! footer read the open already pays.

use bytes::Bytes;
use snafu::{Backtrace, prelude::*};

use crate::predicate::Predicate;

/// Holds at most one filter predicate in serialized form.
///
/// Cloning the carrier is cheap (the buffer is shared), which is how each
/// session receives its own handle on the predicate bytes.
#[derive(Debug, Clone, Default)]
pub struct PredicateCarrier {
    bytes: Option<Bytes>,
}

impl PredicateCarrier {
    /// Creates an empty carrier ("no filtering").
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a buffer produced by another carrier's [`bytes`](Self::bytes),
    /// typically received from the planning side of a process boundary.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// Stores `predicate` in serialized form, or clears the carrier when
    /// `None` is given.
    pub fn set(&mut self, predicate: Option<&Predicate>) -> Result<(), PredicateCodecError> {
        self.bytes = match predicate {
            Some(predicate) => {
                let encoded = serde_json::to_vec(predicate).context(SerializeSnafu)?;
                Some(Bytes::from(encoded))
            }
            None => None,
        };
        Ok(())
    }

    /// Rehydrates a fresh predicate instance from the stored bytes.
    ///
    /// Returns `None` when the carrier is empty. Each call decodes
    /// independently; the result is never cached.
    pub fn get(&self) -> Result<Option<Predicate>, PredicateCodecError> {
        match &self.bytes {
            Some(bytes) => {
                let predicate = serde_json::from_slice(bytes).context(DeserializeSnafu)?;
                Ok(Some(predicate))
            }
            None => Ok(None),
        }
    }

    /// The stored wire bytes, if any.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.bytes.as_ref()
    }
}

/// Errors raised when a predicate fails to cross the transport boundary.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PredicateCodecError {
    /// The predicate could not be serialized.
    #[snafu(display("Failed to serialize filter predicate: {source}"))]
    Serialize {
        /// Underlying encoder error.
        source: serde_json::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The stored bytes could not be decoded into a predicate, for example
    /// because they were produced by an incompatible version.
    #[snafu(display("Failed to deserialize filter predicate: {source}"))]
    Deserialize {
        /// Underlying decoder error.
        source: serde_json::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}
