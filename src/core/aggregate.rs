//! Filepath: src/core/aggregate.rs
//! Writes read results into the snapshot artifact, in manifest order.
//!
//! Block layout, repeated per file:
//!
//! ```text
//! \n
//! <80 x '-'> <relative/path> <80 x '-'>\n
//! <content>\n
//! ```
//!
//! The artifact is staged in a temporary file next to the destination and
//! renamed over it once fully flushed, so a failed or interrupted run leaves
//! nothing behind.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::core::error::SnapshotError;
use crate::core::manifest::Manifest;
use crate::core::reader::FileResult;
use crate::infra::interrupt;

/// Marker characters on each side of the path in a delimiter line
pub const DELIMITER_WIDTH: usize = 80;

/// Character repeated to form the delimiter rule
pub const DELIMITER_MARKER: char = '-';

/// Leading newline plus the framed path line.
pub fn delimiter_line(relative_path: &str) -> String {
    let rule: String = std::iter::repeat_n(DELIMITER_MARKER, DELIMITER_WIDTH).collect();
    format!("\n{rule} {relative_path} {rule}\n")
}

/// Place each result in its manifest slot, keyed by relative path.
///
/// Every manifest entry must receive exactly one result.
pub fn order_results(
    manifest: &Manifest,
    results: Vec<FileResult>,
) -> Result<Vec<FileResult>, SnapshotError> {
    if results.len() != manifest.len() {
        return Err(SnapshotError::Manifest(format!(
            "{} results for {} manifest entries",
            results.len(),
            manifest.len()
        )));
    }

    let mut slots: Vec<Option<FileResult>> = Vec::with_capacity(manifest.len());
    slots.resize_with(manifest.len(), || None);

    for (i, result) in results.into_iter().enumerate() {
        // Fast path: reader output is already positional
        let pos = match manifest.entries().get(i) {
            Some(e) if e.relative_path == result.relative_path => i,
            _ => manifest
                .entries()
                .binary_search_by(|e| e.relative_path.as_bytes().cmp(result.relative_path.as_bytes()))
                .map_err(|_| {
                    SnapshotError::Manifest(format!("unexpected result for {}", result.relative_path))
                })?,
        };

        let slot = &mut slots[pos];
        if slot.is_some() {
            return Err(SnapshotError::Manifest(format!(
                "duplicate result for {}",
                result.relative_path
            )));
        }
        *slot = Some(result);
    }

    // Lengths match and no slot was filled twice, so every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

/// Stream blocks for `results` into `out`, returning the bytes written.
pub fn write_blocks<W: Write>(out: &mut W, results: &[FileResult]) -> std::io::Result<u64> {
    let mut written = 0u64;

    for r in results {
        let header = delimiter_line(&r.relative_path);
        out.write_all(header.as_bytes())?;
        out.write_all(r.content.as_bytes())?;
        out.write_all(b"\n")?;
        written += (header.len() + r.content.len() + 1) as u64;
    }

    out.flush()?;
    Ok(written)
}

/// Create (or replace) the artifact at `dest` from manifest-ordered results.
#[instrument(skip(manifest, results), fields(dest = %dest.display(), files = manifest.len()))]
pub fn write_artifact(
    dest: &Path,
    manifest: &Manifest,
    results: Vec<FileResult>,
) -> Result<u64, SnapshotError> {
    interrupt::check()?;
    let ordered = order_results(manifest, results)?;

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let staged = staging_file(dir).map_err(|e| SnapshotError::write(dest, e))?;
    debug!(staged = %staged.path().display(), "staging artifact");

    let mut writer = BufWriter::new(staged);
    let bytes = write_blocks(&mut writer, &ordered).map_err(|e| SnapshotError::write(dest, e))?;
    let staged = writer
        .into_inner()
        .map_err(|e| SnapshotError::write(dest, e.into_error()))?;

    staged
        .as_file()
        .sync_all()
        .map_err(|e| SnapshotError::write(dest, e))?;
    // Dropping `staged` here deletes the partial file
    interrupt::check()?;
    staged
        .persist(dest)
        .map_err(|e| SnapshotError::write(dest, e.error))?;

    debug!(bytes, "artifact persisted");
    Ok(bytes)
}

fn staging_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".repocat-").suffix(".partial");

    // Match a plainly created file rather than tempfile's 0600
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }

    builder.tempfile_in(dir)
}
