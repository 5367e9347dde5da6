//! Split descriptors for byte-range-partitioned file reads.
//!
//! A split is a contiguous byte range of one Parquet file and is the unit of
//! parallel read assignment. Splits are planned by an external component from
//! file length alone; no file content is inspected at planning time. Each
//! split session later resolves which row groups its byte range covers from
//! its own footer read (see [`crate::session`]), so planning never becomes a
//! footer-parsing bottleneck when fanning out over many files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A contiguous byte range `[start, start + length)` of one Parquet file.
///
/// Splits are immutable and consumed once per session. Candidate host names
/// are scheduling hints for the surrounding engine; the read path ignores
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSplit {
    path: PathBuf,
    start: u64,
    length: u64,
    hosts: Vec<String>,
}

impl FileSplit {
    /// Creates a split covering `[start, start + length)` of the file at
    /// `path`, with no host hints.
    pub fn new(path: impl Into<PathBuf>, start: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            start,
            length,
            hosts: Vec::new(),
        }
    }

    /// Attaches candidate host names for locality-aware scheduling.
    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Path of the file this split belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First byte offset covered by this split.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of bytes covered by this split.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Exclusive end offset of this split.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Candidate hosts for this split, possibly empty.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}
