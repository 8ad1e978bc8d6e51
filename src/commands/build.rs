//! Build and clean commands
//!
//! Load the config, turn its `[[extension]]` tables into targets, and run
//! every target in order.

use anyhow::{Context, Result};
use ext_build::extensions::{Mode, build_extensions};
use ext_build::output::{Console, TerminalConsole};
use ext_build::{Config, HostFamily};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Options collected from flags and environment
#[derive(Debug)]
pub(crate) struct Options {
    pub(crate) mode: Mode,
    pub(crate) dry_run: bool,
    pub(crate) config: Option<PathBuf>,
    pub(crate) color: bool,
}

/// Build every configured extension, or clean all of them
pub(crate) async fn run(options: &Options) -> Result<()> {
    let config = Config::load_with_options(options.config.as_deref())
        .context("Failed to load configuration")?;

    let targets = config.targets(options.dry_run)?;
    let toolchain = config.toolchain(HostFamily::current());
    debug!(
        "{} target(s), host {}, cmake {}",
        targets.len(),
        toolchain.host,
        toolchain.cmake
    );

    let console: Arc<dyn Console> = Arc::new(TerminalConsole::new(options.color));
    let report = build_extensions(targets, &toolchain, &console, options.mode).await?;

    if report.mode == Mode::Build && !options.dry_run {
        let (count, duration) = report.summarize();
        console.note(&format!(
            "Built {count} extension(s) in {:.2}s",
            duration.as_secs_f64()
        ));
    }

    Ok(())
}
