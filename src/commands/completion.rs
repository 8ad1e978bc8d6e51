//! Completion command
//!
//! Generate shell completion scripts

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

/// Generate shell completion scripts
///
/// Outputs completion script for the specified shell to stdout.
///
/// ```bash
/// ext-build --completions bash > /usr/local/share/bash-completion/completions/ext-build
/// ext-build --completions zsh > /usr/local/share/zsh/site-functions/_ext-build
/// ```
#[allow(
    clippy::unnecessary_wraps,
    reason = "Result type kept so every command returns the same shape"
)]
pub(crate) fn run(shell: Shell) -> Result<()> {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "ext-build", &mut io::stdout());
    Ok(())
}
