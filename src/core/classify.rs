//! Filepath: src/core/classify.rs
//! Decides whether a single file belongs in the snapshot.
//!
//! Two mutually exclusive policies:
//! - Content sampling (default): read a fixed-size prefix and score how many
//!   bytes fall outside the printable set. A NUL byte anywhere in the sample
//!   marks the file as binary.
//! - Extension allow-list: case-insensitive match on the file extension.
//!
//! Sampling contract (pinned by tests):
//! - sample size `DEFAULT_SAMPLE_SIZE` = 1024 bytes
//! - empty sample is text
//! - fraction of non-printable bytes **strictly greater** than the threshold
//!   (`DEFAULT_NON_PRINTABLE_THRESHOLD` = 0.30) is binary; exactly equal is text
//! - a sampling I/O error excludes the file

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::infra::io::read_prefix;

/// Bytes read from the head of each file when sampling
pub const DEFAULT_SAMPLE_SIZE: usize = 1024;

/// Largest tolerated fraction of non-printable bytes in a text sample
pub const DEFAULT_NON_PRINTABLE_THRESHOLD: f64 = 0.30;

/// Allow-list used when extension filtering is chosen without a custom set
pub const DEFAULT_EXTENSIONS: &[&str] = &["txt", "md", "py", "cpp", "js"];

/// How files are selected for one run
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPolicy {
    /// Sample a prefix and score its printable ratio
    ContentSample { sample_size: usize, threshold: f64 },

    /// Lower-cased extensions without the leading dot
    Extensions(BTreeSet<String>),
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::ContentSample {
            sample_size: DEFAULT_SAMPLE_SIZE,
            threshold: DEFAULT_NON_PRINTABLE_THRESHOLD,
        }
    }
}

/// Stateless per-file classifier, safe to share across threads
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    policy: SelectionPolicy,
}

impl Classifier {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    /// Content sampling with explicit limits
    pub fn content_sampling(sample_size: usize, threshold: f64) -> Self {
        Self::new(SelectionPolicy::ContentSample { sample_size, threshold })
    }

    /// Extension allow-list; accepts "md", ".md" or "MD" alike
    pub fn extensions<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = exts
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self::new(SelectionPolicy::Extensions(set))
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// True if the file at `path` belongs in the snapshot.
    pub fn classify(&self, path: &Path) -> bool {
        match &self.policy {
            SelectionPolicy::Extensions(set) => extension_allowed(path, set),
            SelectionPolicy::ContentSample { sample_size, threshold } => {
                match read_prefix(path, *sample_size) {
                    Ok(sample) => looks_like_text(&sample, *threshold),
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "sampling failed, excluding");
                        false
                    }
                }
            }
        }
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Case-insensitive extension membership. Files without an extension never match.
pub fn extension_allowed(path: &Path, allowed: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.contains(&e.to_ascii_lowercase()))
}

/// Printable ASCII plus tab, newline and carriage return.
#[inline]
fn is_printable(b: u8) -> bool {
    matches!(b, 32..=126 | b'\t' | b'\n' | b'\r')
}

/// Score a byte sample. Pure function; no I/O.
pub fn looks_like_text(sample: &[u8], threshold: f64) -> bool {
    if sample.is_empty() {
        return true;
    }

    if memchr::memchr(0, sample).is_some() {
        return false;
    }

    let non_printable = sample
        .iter()
        .filter(|&&b| !is_printable(b))
        .count();

    (non_printable as f64 / sample.len() as f64) <= threshold
}
