use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "repocat")]
#[command(
    about = "Clone a repository and concatenate every text file into one flat snapshot document"
)]
#[command(version, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a repocat.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SnapshotArgs {
    /// Repository location (URL, scp-style address, or local path)
    #[arg(value_name = "REPO", required = true)]
    pub repo: Option<String>,

    /// Output file path (default: <repo-name>.md in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Snapshot an existing local directory in place instead of cloning
    #[arg(long)]
    pub local: bool,

    /// Rewrite https://github.com URLs to their SSH form before cloning
    #[arg(long)]
    pub ssh: bool,

    /// Branch or tag to check out when cloning
    #[arg(long)]
    pub branch: Option<String>,

    /// Shallow clone with this many commits of history
    #[arg(long)]
    pub depth: Option<u32>,

    /// Select files by extension instead of content sampling (e.g. md,rs,py)
    #[arg(long, value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Bytes sampled per file when classifying by content
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Maximum fraction of non-printable bytes a text file may contain
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Reader threads (0 = one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Additional glob patterns to ignore
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Skip files matched by .gitignore rules
    #[arg(long)]
    pub respect_gitignore: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script into this directory instead of stdout
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Force stdout even when --out-dir is given
    #[arg(long)]
    pub stdout: bool,
}
