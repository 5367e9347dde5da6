//! Core engine for byte-range split reading of Parquet files.
//!
//! This crate adapts Parquet files into a typed record stream for a batch
//! processing engine, delegating the physical decode to the `parquet` crate
//! and owning the protocol around it:
//!
//! - Split descriptors over byte ranges, planned from file length alone;
//!   each session resolves its own row groups from its own footer read
//!   (`split`, `session` modules).
//! - Serialized transport for an opaque filter predicate, so parallel
//!   readers in isolated execution contexts can each rehydrate their own
//!   instance and push it into the reader as a row filter (`predicate`
//!   module).
//! - An advisory compatibility check between the engine's declared logical
//!   fields and a file's physical schema, decoupled from the read path
//!   (`schema` module).
//! - A bridge from the pull interface onto the engine's reuse-oriented
//!   iteration contract, with copy-out record conversion (`record`,
//!   `bridge` modules).
//!
//! The umbrella crate `parquet-split-input` re-exports the supported public
//! surface; downstream code should prefer it over these module paths.
#![deny(missing_docs)]

pub mod bridge;
pub mod predicate;
pub mod record;
pub mod schema;
pub mod session;
pub mod source;
pub mod split;
