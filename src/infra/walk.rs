//! Filepath: src/infra/walk.rs
//! Full-depth file walker for repository snapshots.
//! - Prunes `.git` directories at any depth before descending into them
//! - Includes hidden files; does not follow symbolic links
//! - Extra ignore globs (early prune + late filter)
//! - Optional .gitignore awareness (off by default)
//! - Deterministic byte-wise ordering by relative path
//!
//! Backed by ripgrep's `ignore` crate and `globset`.
//!
//! Unreadable directories and entries are logged and skipped; a broken
//! subtree never aborts the walk.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::{trace, warn};

/// Version-control metadata directory pruned from every walk
pub const VCS_DIR: &str = ".git";

/// A regular file found under the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile
{
    /// `/`-separated path relative to the walk root
    pub relative: String,

    /// Walk root joined with the relative path
    pub absolute: PathBuf,
}

/// Snapshot walker with optional extra ignore globs.
/// Extra globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Honour .gitignore / .git/info/exclude / global gitignore; default false
    respect_gitignore: bool,
}

impl FileWalker
{
    /// Build a walker with additional ignore patterns (e.g., "target/**",
    /// "node_modules/**", "**/*.min.js"). Patterns match on relative paths.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            respect_gitignore: false,
        })
    }

    /// (Optional) Skip files matched by git ignore rules.
    pub fn with_respect_gitignore(
        mut self,
        respect: bool,
    ) -> Self
    {
        self.respect_gitignore = respect;
        self
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // Start from a bare walk: hidden files in, no ignore files
        b.standard_filters(false);
        b.hidden(false);
        b.follow_links(false);

        if self.respect_gitignore
        {
            b.git_ignore(true);
            b.git_global(true);
            b.git_exclude(true);
        }

        // Early pruning: VCS metadata always, extra globs on directories.
        let extra = self
            .ignore_patterns
            .clone();
        let root_owned = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            // Be conservative on unknown types.
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            if !is_dir || ent.depth() == 0
            {
                return true;
            }

            if ent.file_name() == VCS_DIR
            {
                trace!(path = %ent.path().display(), "pruning vcs directory");
                return false;
            }

            let rel = ent
                .path()
                .strip_prefix(&root_owned)
                .unwrap_or(ent.path());
            !extra.is_match(rel)
        });

        b
    }

    /// Traverse regular files under `root`.
    /// Returns entries **sorted** byte-wise by relative path, without duplicates.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<WalkedFile>
    {
        let root_path = root.as_ref();
        let walker = self
            .build_walk(root_path)
            .build();

        let mut out: Vec<WalkedFile> = walker
            // Listing failures are logged and skipped
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(err) =>
                {
                    warn!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            // Keep only regular files; symlinks and special files drop out here
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .filter_map(|entry| {
                let abs = entry.into_path();
                let rel = relative_key(root_path, &abs)?;
                Some(WalkedFile { relative: rel, absolute: abs })
            })
            // Late file-level extra ignore filtering using RELATIVE path
            .filter(|f| {
                !self
                    .ignore_patterns
                    .is_match(&f.relative)
            })
            .collect();

        // Deterministic order (stable artifacts & tests)
        out.sort_by(|a, b| {
            a.relative
                .as_bytes()
                .cmp(b.relative.as_bytes())
        });
        out.dedup_by(|a, b| a.relative == b.relative);

        out
    }
}

/// `/`-joined relative path, or None (with a warning) for non-UTF-8 names.
fn relative_key(
    root: &Path,
    abs: &Path,
) -> Option<String>
{
    let rel = abs
        .strip_prefix(root)
        .ok()?;

    let mut parts = Vec::new();
    for comp in rel.components()
    {
        match comp
        {
            Component::Normal(name) => match name.to_str()
            {
                Some(s) => parts.push(s),
                None =>
                {
                    warn!(path = %abs.display(), "skipping non UTF-8 path");
                    return None;
                }
            },
            Component::CurDir => {}
            _ => return None,
        }
    }

    if parts.is_empty()
    {
        return None;
    }

    Some(parts.join("/"))
}
