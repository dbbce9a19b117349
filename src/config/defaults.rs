//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

use std::path::PathBuf;

/// Site root defaults to the current directory.
pub fn root() -> PathBuf {
    ".".into()
}
