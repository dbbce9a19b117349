//! Memoized last-modified lookups.
//!
//! Every staleness decision in the build reduces to comparisons of
//! filesystem mtimes, and the same path may be consulted many times in one
//! run (once per page that references it, once per staleness check). The
//! [`TimestampIndex`] stats each path at most once and caches the result
//! for the lifetime of the index.
//!
//! One index is created per build run and passed by reference. It is never
//! persisted: mtimes on disk are the ground truth, so every run starts from
//! an empty cache. Memoization is safe because nothing mutates a path
//! mid-run before it is read, except output paths, which are never re-read.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Per-run cache of filesystem modification times.
///
/// Shared immutably across the worker pool; the interior map is guarded by
/// a mutex so concurrent lookups stay consistent.
#[derive(Debug, Default)]
pub struct TimestampIndex {
    cache: Mutex<FxHashMap<PathBuf, SystemTime>>,
}

impl TimestampIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the last-modified time of `path`.
    ///
    /// A missing path (or one whose metadata cannot be read) is treated as
    /// infinitely old and yields `UNIX_EPOCH`; this is what makes a missing
    /// output unconditionally stale. Never fails.
    pub fn timestamp_of(&self, path: &Path) -> SystemTime {
        if let Some(time) = self.cache.lock().get(path) {
            return *time;
        }

        let time = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        self.cache.lock().insert(path.to_path_buf(), time);
        time
    }
}
