//! Fatal error taxonomy for a snapshot run.
//!
//! Per-file problems (unreadable entries, failed samples, unlistable
//! directories) never surface here: they resolve locally into an excluded
//! file, a logged warning, or an inline placeholder in the artifact.

use std::path::PathBuf;

/// Errors that end a run without producing an artifact
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// `git clone` ran and failed, or the local directory is missing
    #[error("unable to retrieve repository {location}: {detail}")]
    Retrieval { location: String, detail: String },

    /// The `git` executable could not be launched
    #[error("git executable not available: {0}")]
    GitUnavailable(#[source] std::io::Error),

    /// No short name could be derived from the location
    #[error("cannot derive a repository name from '{0}'")]
    InvalidLocation(String),

    /// The output artifact could not be created, written, or persisted
    #[error("failed to write snapshot to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reader results no longer line up with the manifest
    #[error("manifest mismatch: {0}")]
    Manifest(String),

    /// Settings outside their valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Ctrl-C or SIGTERM arrived mid-run
    #[error("interrupted")]
    Interrupted,
}

impl SnapshotError {
    pub(crate) fn write(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        SnapshotError::Write { path: path.into(), source }
    }
}
