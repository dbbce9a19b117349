//! Static asset synchronization.
//!
//! Mirrors the `static/` tree into the output tree file-by-file, using the
//! same staleness rule as pages: copy iff the source is newer than the
//! destination. Copies are byte-exact, never content-transformed.

use crate::{compiler::BuildError, config::SiteConfig, timestamp::TimestampIndex};
use std::{fs, path::Path};

/// Copy one asset into the output tree if it is stale.
///
/// Returns whether a copy actually happened, so the orchestrator can count
/// writes. Parent directories are created as needed; creating an existing
/// directory is not an error.
pub fn sync_asset(
    asset: &Path,
    config: &SiteConfig,
    index: &TimestampIndex,
) -> Result<bool, BuildError> {
    let relative = asset
        .strip_prefix(config.static_path())
        .map_err(|_| BuildError::OutsideRoot(asset.to_path_buf()))?;
    let dest = config.public_path().join(relative);

    if index.timestamp_of(asset) <= index.timestamp_of(&dest) {
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|err| BuildError::Io(parent.to_path_buf(), err))?;
    }
    fs::copy(asset, &dest).map_err(|err| BuildError::Io(dest.clone(), err))?;

    Ok(true)
}
