//! ext-build command-line interface
//!
//! Out-of-tree `CMake` builds for native Python extension modules

use clap::Parser;
use clap_complete::Shell;
use ext_build::env_vars;
use ext_build::extensions::Mode;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

/// Display an error with optional backtrace information
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    eprintln!("error: {err}");

    // Show error chain
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        }
    }
}

#[derive(Parser)]
#[command(name = "ext-build")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Configure, build, install and stub native extension modules with CMake",
    long_about = None
)]
pub(crate) struct Cli {
    /// Clean all built output
    #[arg(long)]
    clean: bool,

    /// Show commands that will be executed without actually running them
    #[arg(long)]
    dry_run: bool,

    /// Config file to use instead of ./.ext-build.toml (env: `EXT_BUILD_CONFIG`)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Show stack backtrace on errors
    #[arg(long)]
    backtrace: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print a completion script for SHELL and exit
    #[arg(long, value_name = "SHELL", exclusive = true)]
    completions: Option<Shell>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ext_build::init_debug(cli.debug);

    let result = if let Some(shell) = cli.completions {
        commands::completion::run(shell)
    } else {
        let options = commands::build::Options {
            mode: if cli.clean { Mode::Clean } else { Mode::Build },
            dry_run: cli.dry_run || env_vars::dry_run(),
            config: cli
                .config
                .or_else(|| env_vars::config_path().map(PathBuf::from)),
            color: !cli.no_color && !env_vars::no_color() && std::io::stdout().is_terminal(),
        };
        commands::build::run(&options).await
    };

    if let Err(e) = result {
        display_error(&e, cli.backtrace || ext_build::is_debug_enabled());
        process::exit(1);
    }
}

mod commands;
