//! Page compilation and asset processing.
//!
//! This module holds the build pipeline proper:
//!
//! - **pages**: load `.yaml` descriptors into fully-materialized records
//! - **render**: convert page bodies and expand the template envelope
//! - **assets**: mirror the static tree into the output tree
//! - **error**: per-artifact error types
//!
//! # Build Flow
//!
//! ```text
//! collect_files() ──► Page::load() ──► is_stale()? ──► Renderer::render()
//!       │                  │                                 │
//!       ▼                  ▼                                 ▼
//!   PathBuf[]          Page (+ sources)                 HTML files
//! ```
//!
//! Staleness is decided here: an output is rebuilt iff any file in its
//! source set, or any template, is newer than the output itself. All mtime
//! lookups go through the per-run [`TimestampIndex`].

pub mod assets;
pub mod error;
pub mod pages;
pub mod render;

pub use assets::sync_asset;
pub use error::BuildError;
pub use pages::Page;
pub use render::{RenderSession, Renderer};

use crate::timestamp::TimestampIndex;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Extension of page descriptor files.
pub const DESCRIPTOR_EXT: &str = "yaml";

/// Extension of rendered outputs and of template files.
pub const OUTPUT_EXT: &str = "html";

/// Transient editor lock files, skipped by the asset pass.
pub const LOCK_FILE_SUFFIX: &str = ".swp";

/// Collect all files under `dir` matching `keep`, in a stable order.
///
/// A missing directory yields an empty set rather than an error.
pub fn collect_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| keep(path))
        .collect();
    files.sort();
    files
}

/// Maximum mtime across a dependency set.
///
/// The set is expected to be non-empty (a page's source set always contains
/// at least its own descriptor). An empty set reduces to `UNIX_EPOCH`,
/// which is older than anything and therefore contributes no staleness.
pub fn newest_timestamp(paths: &[PathBuf], index: &TimestampIndex) -> SystemTime {
    debug_assert!(!paths.is_empty(), "dependency set must not be empty");
    paths
        .iter()
        .map(|path| index.timestamp_of(path))
        .max()
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Decide whether `output` must be regenerated.
///
/// Stale iff any source, or the template set as a whole, is strictly newer
/// than the output. A missing output has mtime `UNIX_EPOCH` and so is
/// always stale. `templates_mtime` is the pre-reduced max mtime of the
/// whole template set: any template change invalidates every page,
/// deliberately coarse in favor of correctness.
pub fn is_stale(
    output: &Path,
    sources: &[PathBuf],
    templates_mtime: SystemTime,
    index: &TimestampIndex,
) -> bool {
    let output_time = index.timestamp_of(output);
    newest_timestamp(sources, index) > output_time || templates_mtime > output_time
}
