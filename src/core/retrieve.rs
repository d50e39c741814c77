//! Repository retrieval via the system `git` client.
//!
//! `git` is a black box here: it either populates the destination with a
//! working tree or the run ends with a retrieval error. The clone lives in a
//! [`Workspace`], a scoped temporary directory removed when dropped. The
//! clone is polled against a cancel flag; on cancel the `git` process group
//! is killed and the partial workspace removed before returning.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::core::error::SnapshotError;
use crate::infra::interrupt;

const GITHUB_HTTPS: &str = "https://github.com/";

/// How often a running clone checks for cancellation
const CLONE_POLL: Duration = Duration::from_millis(50);

/// Attempts at removing a cancelled workspace while `git` helpers exit
const REMOVE_ATTEMPTS: usize = 20;

/// Extra `git clone` knobs
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Branch or tag passed to `--branch`
    pub branch: Option<String>,
    /// History depth passed to `--depth`
    pub depth: Option<u32>,
    /// Pass `--quiet` to git
    pub quiet: bool,
}

/// Scoped clone directory; the tree is deleted on drop.
#[derive(Debug)]
pub struct Workspace {
    tmp: TempDir,
    repo_dir: PathBuf,
}

impl Workspace {
    /// Root of the checked-out working tree
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Temporary directory holding the clone
    pub fn path(&self) -> &Path {
        self.tmp.path()
    }
}

/// Rewrite `https://github.com/owner/repo[/]` to `git@github.com:owner/repo.git`
/// when `prefer_ssh` is set. Anything else passes through untouched.
pub fn normalize_location(location: &str, prefer_ssh: bool) -> String {
    if !prefer_ssh {
        return location.to_string();
    }

    match location.strip_prefix(GITHUB_HTTPS) {
        Some(path) => {
            let path = path.trim_end_matches('/');
            if path.ends_with(".git") {
                format!("git@github.com:{path}")
            } else {
                format!("git@github.com:{path}.git")
            }
        }
        None => location.to_string(),
    }
}

/// Short repository name used for the default artifact file name.
///
/// `https://github.com/o/tool.git/` → `tool`, `git@host:tool.git` → `tool`.
pub fn repo_name(location: &str) -> Result<String, SnapshotError> {
    let trimmed = location.trim().trim_end_matches(['/', '\\']);
    let last = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() || name == "." || name == ".." {
        return Err(SnapshotError::InvalidLocation(location.to_string()));
    }
    Ok(name.to_string())
}

/// Verify `git` can be launched.
fn detect_git_executable() -> Result<PathBuf, SnapshotError> {
    let output = Command::new("git")
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(SnapshotError::GitUnavailable)?;

    let version = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() || !version.contains("git version") {
        return Err(SnapshotError::GitUnavailable(std::io::Error::other(format!(
            "unexpected `git --version` output: {}",
            version.trim()
        ))));
    }

    debug!(version = %version.trim(), "git detected");
    Ok(PathBuf::from("git"))
}

/// Clone `address` into a fresh workspace under the system temp dir,
/// giving up when the process is interrupted.
pub fn clone_into_workspace(address: &str, opts: &CloneOptions) -> Result<Workspace, SnapshotError> {
    clone_in(&std::env::temp_dir(), address, opts, interrupt::flag())
}

/// Clone `address` into a fresh workspace under `parent`.
///
/// Setting `cancel` while `git` runs kills it and removes the workspace.
#[instrument(skip(parent, opts, cancel))]
pub fn clone_in(
    parent: &Path,
    address: &str,
    opts: &CloneOptions,
    cancel: &AtomicBool,
) -> Result<Workspace, SnapshotError> {
    let git = detect_git_executable()?;

    let tmp = tempfile::Builder::new()
        .prefix("repo_clone_")
        .tempdir_in(parent)
        .map_err(|e| SnapshotError::Retrieval {
            location: address.to_string(),
            detail: format!("cannot create temporary directory: {e}"),
        })?;
    let repo_dir = tmp.path().join("repo");

    let mut cmd = Command::new(git);
    cmd.arg("clone");
    if opts.quiet {
        cmd.arg("--quiet");
    }
    if let Some(depth) = opts.depth {
        cmd.arg("--depth").arg(depth.to_string());
    }
    if let Some(branch) = &opts.branch {
        cmd.arg("--branch").arg(branch);
    }
    cmd.arg("--")
        .arg(address)
        .arg(&repo_dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    // Own process group: transport helpers die with git when cancelled
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    info!("cloning repository");
    let mut child = cmd.spawn().map_err(SnapshotError::GitUnavailable)?;

    // Drain stderr off-thread so a chatty git never blocks on a full pipe
    let stderr = child.stderr.take();
    let drain = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut s) = stderr {
            let _ = s.read_to_end(&mut buf);
        }
        buf
    });

    let status = loop {
        if cancel.load(Ordering::SeqCst) {
            kill_clone(&mut child);
            remove_partial(tmp.path());
            warn!("clone cancelled, workspace removed");
            return Err(SnapshotError::Interrupted);
        }
        match child.try_wait().map_err(SnapshotError::GitUnavailable)? {
            Some(status) => break status,
            None => thread::sleep(CLONE_POLL),
        }
    };

    if !status.success() {
        let stderr = drain.join().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr);
        let detail = match stderr.trim() {
            "" => format!("git clone exited with {status}"),
            msg => msg.to_string(),
        };
        return Err(SnapshotError::Retrieval {
            location: address.to_string(),
            detail,
        });
    }

    debug!(workspace = %tmp.path().display(), "clone complete");
    Ok(Workspace { tmp, repo_dir })
}

/// Kill `git` together with any helpers it spawned, then reap it.
fn kill_clone(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = i32::try_from(child.id()) {
            // SAFETY: plain kill(2) on the process group created for this child
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Remove a cancelled clone, retrying while exiting helpers release files.
fn remove_partial(dir: &Path) {
    for _ in 0..REMOVE_ATTEMPTS {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => return,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                debug!(error = %e, "workspace still busy");
                thread::sleep(CLONE_POLL);
            }
        }
    }
    warn!(path = %dir.display(), "could not fully remove cancelled workspace");
}
