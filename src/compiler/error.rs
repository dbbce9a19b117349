//! Build error types.
//!
//! Every failure is either fatal-and-reported or skip-and-reported; there is
//! no retry and no rollback of already-written outputs. Page-level errors
//! carry the page identity so the orchestrator can report them without
//! aborting sibling artifacts.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, rendering or copying a single artifact.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed content in `{0}`")]
    MalformedContent(PathBuf, #[source] serde_yaml::Error),

    #[error("missing external source `{path}` referenced from `{referenced_from}`")]
    MissingSource {
        path: PathBuf,
        referenced_from: PathBuf,
    },

    #[error("file `{0}` is outside its content root")]
    OutsideRoot(PathBuf),

    #[error("template expansion failed for `{page}`")]
    Template {
        page: String,
        #[source]
        source: tera::Error,
    },

    #[error("markup conversion failed for `{page}`: {detail}")]
    Markup { page: String, detail: String },
}
