//! `repocat completions <SHELL>`: completion scripts for the snapshot CLI.
//!
//! Scripts go to stdout unless `--out-dir` names a directory.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Generator, Shell as Target};

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

fn target(shell: Shell) -> Target {
    match shell {
        Shell::Bash => Target::Bash,
        Shell::Zsh => Target::Zsh,
        Shell::Fish => Target::Fish,
        Shell::PowerShell => Target::PowerShell,
        Shell::Elvish => Target::Elvish,
    }
}

/// Completion script for `shell`, named after the binary.
pub fn render(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    let mut buf = Vec::new();
    clap_complete::generate(target(shell), &mut cmd, bin, &mut buf);
    buf
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    let script = render(args.shell);

    let dir = match args.out_dir {
        Some(dir) if !args.stdout => dir,
        _ => {
            io::stdout().write_all(&script).context("write completion script")?;
            return Ok(());
        }
    };

    let path = dir.join(target(args.shell).file_name(Cli::command().get_name()));
    if ctx.dry_run {
        if !ctx.quiet {
            println!("Would write completion to {}", path.display());
        }
        return Ok(());
    }

    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    fs::write(&path, script).with_context(|| format!("write {}", path.display()))?;

    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}
