//! Curtain: run startup commands, wait for a trigger, run cleanup once.
//!
//! # Usage
//!
//! ```text
//! curtain [DIR]     # reads DIR/commands.json (DIR defaults to the current directory)
//! ```
//!
//! Exit status is 0 after a trigger-driven shutdown (ctrl-c or hot-key) and
//! 1 when the config cannot be loaded, a hot-key cannot be registered, or a
//! startup step fails.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use curtain_core::config;
use curtain_lifecycle::{init_tracing, start_blocking, Termination};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "curtain",
    version,
    about = "Run startup commands, then clean up exactly once on ctrl-c or a global hot-key",
    long_about = None,
)]
struct Cli {
    /// Directory containing commands.json.
    dir: Option<PathBuf>,
}

impl Cli {
    fn run(self) -> Result<Termination> {
        let dir = config::resolve_dir(self.dir.as_deref())
            .context("cannot resolve config directory")?;
        let cfg = config::load_from_dir(&dir)
            .with_context(|| format!("failed to load commands from '{}'", dir.display()))?;

        tracing::info!(
            startup = cfg.startup.len(),
            cleanup = cfg.cleanup.len(),
            hotkeys = cfg.hotkeys.len(),
            "loaded {}",
            config::config_path(&dir).display()
        );

        start_blocking(cfg).context("lifecycle aborted before startup")
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let termination = cli.run()?;
    tracing::info!(trigger = %termination.trigger, code = termination.code, "exiting");
    std::process::exit(termination.code)
}
