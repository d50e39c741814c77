use anyhow::Result;
use clap::Parser;
use repocat::cli::{AppContext, Cli, Commands};
use repocat::infra::interrupt;

fn main() -> Result<()> {
    let cli = Cli::parse();

    repocat::infra::logging::init(cli.verbose, cli.quiet);
    interrupt::install()?;

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    let outcome = match cli.command {
        Some(Commands::Init(args)) => repocat::infra::config::init(args, &ctx),
        Some(Commands::Completions(args)) => repocat::completion::run(args, &ctx),
        None => repocat::snapshot_run(cli.snapshot, &ctx),
    };

    // Workspace and staged artifact are already gone at this point
    if outcome.is_err() && interrupt::is_interrupted() {
        eprintln!("Interrupted; nothing written");
        std::process::exit(interrupt::INTERRUPT_EXIT_CODE);
    }
    outcome
}
