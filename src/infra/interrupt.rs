//! Filepath: src/infra/interrupt.rs
//! Ctrl-C / SIGTERM handling.
//!
//! The handler only raises a flag. Long-running phases poll it and unwind
//! with [`SnapshotError::Interrupted`], so the clone workspace and any
//! staged artifact are removed by their normal drops before the process
//! exits. A second signal forces an immediate exit.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

use crate::core::error::SnapshotError;

/// Exit status used after an interrupt (128 + SIGINT)
pub const INTERRUPT_EXIT_CODE: i32 = 130;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install the process-wide signal handler.
pub fn install() -> Result<()> {
    ctrlc::set_handler(|| {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            eprintln!("\nForce shutdown!");
            std::process::exit(INTERRUPT_EXIT_CODE);
        }
        eprintln!("\nInterrupt received, cleaning up... (press Ctrl+C again to force)");
    })
    .context("Failed to set signal handler")
}

/// The process-wide interrupt flag
pub fn flag() -> &'static AtomicBool {
    &INTERRUPTED
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// `Err(Interrupted)` once a signal has arrived.
pub fn check() -> Result<(), SnapshotError> {
    if is_interrupted() {
        Err(SnapshotError::Interrupted)
    } else {
        Ok(())
    }
}
