//! **repocat** - Clone a repository and flatten its text files into one document
//!
//! Content-sampled (or extension-filtered) file selection, parallel reads,
//! and a deterministic, path-ordered snapshot artifact.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core pipeline - selection, concurrent reads, ordered aggregation
pub mod core {
    /// Text-vs-binary and extension classification
    pub mod classify;
    pub use classify::{Classifier, SelectionPolicy, looks_like_text};

    /// Fatal error taxonomy
    pub mod error;
    pub use error::SnapshotError;

    /// Ordered file manifest built from a directory walk
    pub mod manifest;
    pub use manifest::{FileEntry, Manifest, build_manifest};

    /// Bounded parallel reader producing one result per manifest entry
    pub mod reader;
    pub use reader::{FileResult, ReaderPool};

    /// Delimiter framing and atomic artifact writes
    pub mod aggregate;
    pub use aggregate::write_artifact;

    /// `git clone` into a scoped temporary workspace
    pub mod retrieve;

    /// Run-level state machine and the snapshot command
    pub mod pipeline;
    pub use pipeline::{Pipeline, SnapshotReport, Stage, run as snapshot_run};
}

/// Infrastructure - Configuration, I/O, walking, and logging
pub mod infra {
    /// Layered configuration (file, env, CLI)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Prefix sampling and lossy whole-file reads (mmap for large files)
    pub mod io;
    pub use io::{read_lossy, read_prefix};

    /// Full-depth walker that prunes `.git`
    pub mod walk;
    pub use walk::FileWalker;

    /// tracing-subscriber setup
    pub mod logging;

    /// Signal flag polled by the clone, read and write phases
    pub mod interrupt;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use crate::core::{Classifier, Manifest, Pipeline, SnapshotError, snapshot_run};
pub use infra::{Config, FileWalker, load_config};
