use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs, SnapshotArgs};
use crate::core::classify::{
    Classifier, DEFAULT_EXTENSIONS, DEFAULT_NON_PRINTABLE_THRESHOLD, DEFAULT_SAMPLE_SIZE,
};
use crate::core::error::SnapshotError;

/// Config file names checked in the working directory, first match wins
const CONFIG_FILES: [&str; 4] = ["repocat.toml", "repocat.yaml", "repocat.json", ".repocat.toml"];

/// File selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection
{
    /// Sample file heads and reject binary-looking content
    Sample,

    /// Keep only files whose extension is listed
    Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// How files are selected
    pub selection: Selection,

    /// Allow-list used when `selection = "extensions"`
    pub extensions: Vec<String>,

    /// Bytes sampled per file when `selection = "sample"`
    pub sample_size: usize,

    /// Largest tolerated non-printable fraction (inclusive)
    pub non_printable_threshold: f64,

    /// Extra ignore globs, matched on relative paths
    pub ignore_patterns: Vec<String>,

    /// Reader threads; 0 = one per CPU
    pub jobs: usize,

    /// Skip files matched by .gitignore rules
    pub respect_gitignore: bool,

    /// Clone GitHub https URLs over SSH
    pub prefer_ssh: bool,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            selection: Selection::Sample,
            extensions: DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            non_printable_threshold: DEFAULT_NON_PRINTABLE_THRESHOLD,
            ignore_patterns: Vec::new(),
            jobs: 0,
            respect_gitignore: false,
            prefer_ssh: false,
        }
    }
}

impl Config
{
    /// Layer CLI flags on top of file/env settings.
    pub fn apply_args(
        &mut self,
        args: &SnapshotArgs,
    )
    {
        if !args
            .extensions
            .is_empty()
        {
            self.selection = Selection::Extensions;
            self.extensions = args
                .extensions
                .clone();
        }
        if let Some(n) = args.sample_size
        {
            self.sample_size = n;
        }
        if let Some(t) = args.threshold
        {
            self.non_printable_threshold = t;
        }
        if let Some(j) = args.jobs
        {
            self.jobs = j;
        }
        self.ignore_patterns
            .extend(args.ignore.iter().cloned());
        self.respect_gitignore |= args.respect_gitignore;
        self.prefer_ssh |= args.ssh;
    }

    /// Reject settings the classifier or walker cannot honour. Runs before
    /// retrieval, so a bad value never costs a clone.
    pub fn validate(&self) -> Result<(), SnapshotError>
    {
        if !(0.0..=1.0).contains(&self.non_printable_threshold)
        {
            return Err(SnapshotError::InvalidConfig(format!(
                "non_printable_threshold must be within 0..=1, got {}",
                self.non_printable_threshold
            )));
        }
        if self.sample_size == 0
        {
            return Err(SnapshotError::InvalidConfig(
                "sample_size must be greater than zero".to_string(),
            ));
        }
        for pattern in &self.ignore_patterns
        {
            globset::Glob::new(pattern).map_err(|e| {
                SnapshotError::InvalidConfig(format!("ignore pattern '{pattern}': {e}"))
            })?;
        }
        if self.selection == Selection::Extensions
            && self
                .extensions
                .is_empty()
        {
            return Err(SnapshotError::InvalidConfig(
                "extension selection needs at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    /// Classifier for the configured policy. Policies are never blended.
    pub fn classifier(&self) -> Classifier
    {
        match self.selection
        {
            Selection::Sample =>
            {
                Classifier::content_sampling(self.sample_size, self.non_printable_threshold)
            }
            Selection::Extensions => Classifier::extensions(&self.extensions),
        }
    }
}

/// Load configuration from the current directory and `REPOCAT_*` variables.
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load configuration from `dir` and `REPOCAT_*` variables.
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // Add environment variables with REPOCAT_ prefix (REPOCAT_SAMPLE_SIZE=512)
    builder = builder.add_source(
        config::Environment::with_prefix("REPOCAT")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("extensions")
            .with_list_parse_key("ignore_patterns"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("repocat.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would write {}:\n{}", config_path.display(), toml_string);
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
