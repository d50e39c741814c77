//! Filepath: src/core/pipeline.rs
//! Run-level orchestration: retrieve → walk → read → write.
//!
//! Phases are strictly sequential; only the read phase is parallel. The
//! clone workspace is owned by the running command and dropped (removed)
//! on every exit path, fatal or not.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, info, instrument, warn};

use crate::cli::{AppContext, SnapshotArgs};
use crate::core::aggregate::write_artifact;
use crate::core::error::SnapshotError;
use crate::core::manifest::{Manifest, build_manifest};
use crate::core::reader::ReaderPool;
use crate::core::retrieve::{self, CloneOptions, Workspace};
use crate::infra::config::{Config, load_config};
use crate::infra::interrupt;
use crate::infra::walk::FileWalker;

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Retrieving,
    Walking,
    Reading,
    Writing,
    Done,
    Failed,
}

impl Stage {
    /// Legal forward transitions. `Failed` is only entered from the stages
    /// whose failures are fatal (retrieval and writing).
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Idle, Retrieving)
                | (Retrieving, Walking)
                | (Retrieving, Failed)
                | (Walking, Reading)
                | (Reading, Writing)
                | (Writing, Done)
                | (Writing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Delimiter blocks written
    pub files: usize,
    /// Blocks carrying a read-error placeholder
    pub failed_reads: usize,
    pub bytes_written: u64,
    pub output: PathBuf,
}

/// Where the snapshot root comes from
#[derive(Debug)]
enum Source {
    Local(PathBuf),
    Cloned(Workspace),
}

impl Source {
    fn root(&self) -> &Path {
        match self {
            Source::Local(p) => p.as_path(),
            Source::Cloned(ws) => ws.repo_dir(),
        }
    }
}

/// Stage-tracking driver for the walk/read/write phases
pub struct Pipeline {
    stage: Stage,
    config: Config,
    progress: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            stage: Stage::Idle,
            config,
            progress: false,
        }
    }

    /// Show a progress bar during the read phase.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.progress = show;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal stage transition {:?} -> {:?}",
            self.stage,
            next
        );
        debug!(from = ?self.stage, to = ?next, "stage transition");
        self.stage = next;
    }

    /// Mark the run failed if the current stage allows it.
    fn fail(&mut self) {
        if self.stage.can_advance_to(Stage::Failed) {
            self.advance(Stage::Failed);
        } else {
            warn!(stage = ?self.stage, "fatal error outside a failing stage");
            self.stage = Stage::Failed;
        }
    }

    /// Run the retrieval phase and wrap its outcome.
    fn retrieve<T>(
        &mut self,
        f: impl FnOnce() -> Result<T, SnapshotError>,
    ) -> Result<T, SnapshotError> {
        self.advance(Stage::Retrieving);
        f().inspect_err(|_| self.fail())
    }

    /// Build the manifest for `root`, leaving out `dest` if it lives inside.
    #[instrument(skip(self))]
    pub fn walk(&mut self, root: &Path, dest: &Path) -> Result<Manifest> {
        self.advance(Stage::Walking);

        let walker = FileWalker::new(&self.config.ignore_patterns)
            .context("Invalid ignore pattern")?
            .with_respect_gitignore(self.config.respect_gitignore);
        let classifier = self.config.classifier();

        let mut manifest = build_manifest(root, &classifier, &walker)?;
        interrupt::check()?;
        if let Ok(dest) = dunce::canonicalize(dest)
            && manifest.exclude_path(&dest)
        {
            debug!(path = %dest.display(), "previous artifact left out of manifest");
        }
        Ok(manifest)
    }

    /// Read and write phases for an existing manifest.
    pub fn read_and_write(&mut self, manifest: &Manifest, dest: &Path) -> Result<SnapshotReport> {
        self.advance(Stage::Reading);
        let pool = ReaderPool::new(self.config.jobs).with_progress(self.progress_bar(manifest.len()));
        let results = pool.read_all(manifest)?;
        let failed_reads = results.iter().filter(|r| !r.ok).count();

        self.advance(Stage::Writing);
        let bytes_written = match write_artifact(dest, manifest, results) {
            Ok(n) => n,
            Err(e) => {
                self.fail();
                return Err(e.into());
            }
        };

        self.advance(Stage::Done);
        info!(files = manifest.len(), failed_reads, bytes_written, "snapshot written");
        Ok(SnapshotReport {
            files: manifest.len(),
            failed_reads,
            bytes_written,
            output: dest.to_path_buf(),
        })
    }

    /// Snapshot an already-present directory tree into `dest`.
    pub fn snapshot_dir(&mut self, root: &Path, dest: &Path) -> Result<SnapshotReport> {
        let root = self.retrieve(|| resolve_local(root))?;
        let manifest = self.walk(&root, dest)?;
        self.read_and_write(&manifest, dest)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} reading")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}

/// Existing directory, with `~` expanded.
fn resolve_local(path: &Path) -> Result<PathBuf, SnapshotError> {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&*raw).into_owned());

    if !expanded.is_dir() {
        return Err(SnapshotError::Retrieval {
            location: raw.into_owned(),
            detail: "not a directory".to_string(),
        });
    }
    dunce::canonicalize(&expanded).map_err(|e| SnapshotError::Retrieval {
        location: raw.into_owned(),
        detail: e.to_string(),
    })
}

/// `<name>.md` next to the working directory unless overridden.
fn output_path(args: &SnapshotArgs, name: &str) -> PathBuf {
    match &args.output {
        Some(p) => p.clone(),
        None => PathBuf::from(format!("{name}.md")),
    }
}

/// `repocat <REPO>` command handler.
pub fn run(args: SnapshotArgs, ctx: &AppContext) -> Result<()> {
    let location = args
        .repo
        .clone()
        .ok_or_else(|| anyhow::anyhow!("missing repository location"))?;

    let mut config = load_config()?;
    config.apply_args(&args);
    config.validate()?;

    let mut pipeline = Pipeline::new(config).with_progress(!ctx.quiet);

    // Retrieval; a Workspace is dropped (and deleted) when `source` goes out of
    // scope. A dry run clones too, so the listed manifest is the real one.
    let (source, name) = if args.local {
        let root = pipeline.retrieve(|| resolve_local(Path::new(&location)))?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SnapshotError::InvalidLocation(location.clone()))?;
        (Source::Local(root), name)
    } else {
        let name = retrieve::repo_name(&location)?;
        let address = retrieve::normalize_location(&location, pipeline.config().prefer_ssh);
        let opts = CloneOptions {
            branch: args.branch.clone(),
            depth: args.depth,
            quiet: ctx.quiet,
        };
        if !ctx.quiet {
            eprintln!("Cloning {address} ...");
        }
        let ws = pipeline
            .retrieve(|| retrieve::clone_into_workspace(&address, &opts))
            .with_context(|| format!("Retrieval of {location} failed"))?;
        (Source::Cloned(ws), name)
    };

    let dest = output_path(&args, &name);
    let manifest = pipeline.walk(source.root(), &dest)?;

    if ctx.dry_run {
        print_dry_manifest(ctx, &manifest, &dest);
        return Ok(());
    }

    let report = pipeline
        .read_and_write(&manifest, &dest)
        .with_context(|| format!("Snapshot of {location} failed"))?;

    print_report(ctx, &report);
    Ok(())
}

fn print_dry_manifest(ctx: &AppContext, manifest: &Manifest, dest: &Path) {
    if ctx.quiet {
        return;
    }
    let head = format!("DRY RUN: Would write {} files to {}:", manifest.len(), dest.display());
    if ctx.no_color {
        println!("{head}");
    } else {
        println!("{}", head.yellow());
    }
    for entry in manifest {
        println!("  {}", entry.relative_path);
    }
}

fn print_report(ctx: &AppContext, report: &SnapshotReport) {
    if ctx.quiet {
        return;
    }
    let line = format!(
        "Wrote {} files ({} bytes) to {}",
        report.files,
        report.bytes_written,
        report.output.display()
    );
    if ctx.no_color {
        println!("✓ {line}");
    } else {
        println!("{} {line}", "✓".green());
    }

    if report.failed_reads > 0 {
        let warn_line = format!(
            "{} files could not be read; placeholders written in their blocks",
            report.failed_reads
        );
        if ctx.no_color {
            println!("! {warn_line}");
        } else {
            println!("{} {warn_line}", "!".yellow());
        }
    }
}
