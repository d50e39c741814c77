//! Filepath: src/core/manifest.rs
//! Builds the ordered list of files that go into a snapshot.
//!
//! The manifest is fixed before any content is read and its order
//! (byte-wise by relative path) is the order of the final artifact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::classify::Classifier;
use crate::infra::walk::FileWalker;

/// One file selected for the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// `/`-separated path relative to the snapshot root; unique per manifest
    pub relative_path: String,
    /// Resolved location on disk
    pub absolute_path: PathBuf,
}

/// Ordered, duplicate-free list of entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<FileEntry>,
}

impl Manifest {
    /// Build from arbitrary entries, enforcing order and uniqueness.
    pub fn from_entries(mut entries: Vec<FileEntry>) -> Self {
        entries.sort_by(|a, b| a.relative_path.as_bytes().cmp(b.relative_path.as_bytes()));
        entries.dedup_by(|a, b| a.relative_path == b.relative_path);
        Self { entries }
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    /// Drop the entry stored at `path`, if any. Returns whether one was removed.
    pub fn exclude_path(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.absolute_path != path);
        before != self.entries.len()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Walk `root`, classify every regular file, and return the sorted manifest.
#[instrument(skip(root, classifier, walker), fields(root = %root.display()))]
pub fn build_manifest(root: &Path, classifier: &Classifier, walker: &FileWalker) -> Result<Manifest> {
    let root = dunce::canonicalize(root)
        .with_context(|| format!("Failed to resolve snapshot root {}", root.display()))?;

    let walked = walker.walk_files(&root);
    let seen = walked.len();

    let entries: Vec<FileEntry> = walked
        .into_iter()
        .filter(|f| {
            let keep = classifier.classify(&f.absolute);
            if !keep {
                debug!(path = %f.relative, "excluded by classifier");
            }
            keep
        })
        .map(|f| FileEntry {
            relative_path: f.relative,
            absolute_path: f.absolute,
        })
        .collect();

    let manifest = Manifest::from_entries(entries);
    info!(seen, selected = manifest.len(), "manifest built");
    Ok(manifest)
}
