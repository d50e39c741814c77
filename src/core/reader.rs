//! Filepath: src/core/reader.rs
//! Concurrent content reads over a fixed manifest.
//!
//! Reads fan out over a dedicated rayon pool. Results are collected by
//! index, so slot `i` always belongs to manifest entry `i` whatever order
//! the workers finish in. A failed read becomes a placeholder result; it
//! never aborts the batch.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::core::manifest::{FileEntry, Manifest};
use crate::infra::interrupt;
use crate::infra::io::read_lossy;

/// Content of one manifest entry, or the reason it could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub relative_path: String,
    /// Decoded text, or the inline failure placeholder when `ok` is false
    pub content: String,
    pub ok: bool,
    pub error: Option<String>,
}

impl FileResult {
    /// Read one entry; I/O failures are folded into the result.
    pub fn read(entry: &FileEntry) -> Self {
        match read_lossy(&entry.absolute_path) {
            Ok(content) => Self {
                relative_path: entry.relative_path.clone(),
                content,
                ok: true,
                error: None,
            },
            Err(e) => {
                warn!(path = %entry.relative_path, error = %e, "read failed, writing placeholder");
                Self::failed(&entry.relative_path, e.to_string())
            }
        }
    }

    pub fn failed(relative_path: &str, detail: String) -> Self {
        Self {
            relative_path: relative_path.to_string(),
            content: read_error_placeholder(&detail),
            ok: false,
            error: Some(detail),
        }
    }
}

/// Inline text written in place of content that could not be read
pub fn read_error_placeholder(detail: &str) -> String {
    format!("[Error reading file: {detail}]")
}

/// Bounded worker pool for the read phase
pub struct ReaderPool {
    /// Worker count; 0 means one per available CPU
    jobs: usize,
    progress: ProgressBar,
}

impl ReaderPool {
    pub fn new(jobs: usize) -> Self {
        Self {
            jobs,
            progress: ProgressBar::hidden(),
        }
    }

    /// Tick `progress` once per completed read.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Read every entry exactly once. The returned vector has the manifest's
    /// length and order.
    #[instrument(skip_all, fields(files = manifest.len(), jobs = self.jobs))]
    pub fn read_all(&self, manifest: &Manifest) -> Result<Vec<FileResult>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("repocat-reader-{i}"))
            .build()
            .context("Failed to start reader pool")?;

        self.progress.set_length(manifest.len() as u64);

        let results: Vec<FileResult> = pool.install(|| {
            manifest
                .entries()
                .par_iter()
                .map(|entry| {
                    // After a signal the batch drains without touching disk
                    let result = if interrupt::is_interrupted() {
                        FileResult::failed(&entry.relative_path, "interrupted".to_string())
                    } else {
                        FileResult::read(entry)
                    };
                    self.progress.inc(1);
                    result
                })
                .collect()
        });

        self.progress.finish_and_clear();

        let failed = results.iter().filter(|r| !r.ok).count();
        info!(read = results.len(), failed, "read phase complete");
        Ok(results)
    }
}
