//! Multi-target orchestration
//!
//! Runs every configured extension one at a time, in the order they were
//! listed. A build runs configure, build and stub generation per target; a
//! clean runs only clean. The first failure stops the run, so targets after
//! a failing one are never touched.

use super::cmake_extension::CmakeExtension;
use super::error::ExtensionError;
use super::target::{ExtensionTarget, Toolchain};
use super::types::{BuildResult, Phase};
use crate::output::Console;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// What to do with each target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// configure, build, stubgen
    #[default]
    Build,
    /// clean only
    Clean,
}

/// Outcome of a completed run over all targets
#[derive(Debug)]
pub struct BuildReport {
    /// Mode the run used
    pub mode: Mode,
    /// One result per target, in run order
    pub results: Vec<BuildResult>,
}

impl BuildReport {
    /// (`target_count`, `total_duration`)
    #[must_use]
    pub fn summarize(&self) -> (usize, Duration) {
        let total = self.results.iter().map(|r| r.duration).sum();
        (self.results.len(), total)
    }
}

/// Extension builder coordinator
#[derive(Debug)]
pub struct ExtensionBuilder {
    extensions: Vec<CmakeExtension>,
}

impl ExtensionBuilder {
    /// Create a controller per target, all sharing `toolchain` and `console`
    #[must_use]
    pub fn new(
        targets: Vec<ExtensionTarget>,
        toolchain: &Toolchain,
        console: &Arc<dyn Console>,
    ) -> Self {
        let extensions = targets
            .into_iter()
            .map(|target| CmakeExtension::new(target, toolchain.clone(), Arc::clone(console)))
            .collect();
        Self { extensions }
    }

    /// Controllers in run order
    #[must_use]
    pub fn extensions(&self) -> &[CmakeExtension] {
        &self.extensions
    }

    /// Run `mode` over every target in order
    pub async fn run(&self, mode: Mode) -> Result<BuildReport, ExtensionError> {
        let mut results = Vec::with_capacity(self.extensions.len());

        for ext in &self.extensions {
            let module = ext.target().module().to_string();
            debug!("{module}: {mode:?}");

            let start = Instant::now();
            let phases = match mode {
                Mode::Build => ext.run_default().await?,
                Mode::Clean => {
                    ext.clean().await?;
                    vec![Phase::Clean]
                }
            };

            results.push(BuildResult::new(module, phases, start.elapsed()));
        }

        Ok(BuildReport { mode, results })
    }
}

/// Run `mode` over `targets` (convenience function)
///
/// ```no_run
/// use ext_build::extensions::{ExtensionError, ExtensionTarget, Mode, Toolchain, build_extensions};
/// use ext_build::output::{Console, TerminalConsole};
/// use std::sync::Arc;
///
/// # async fn demo(targets: Vec<ExtensionTarget>) -> Result<(), ExtensionError> {
/// let console: Arc<dyn Console> = Arc::new(TerminalConsole::new(true));
/// let report = build_extensions(targets, &Toolchain::default(), &console, Mode::Build).await?;
/// println!("built {} target(s)", report.results.len());
/// # Ok(())
/// # }
/// ```
pub async fn build_extensions(
    targets: Vec<ExtensionTarget>,
    toolchain: &Toolchain,
    console: &Arc<dyn Console>,
    mode: Mode,
) -> Result<BuildReport, ExtensionError> {
    ExtensionBuilder::new(targets, toolchain, console)
        .run(mode)
        .await
}
