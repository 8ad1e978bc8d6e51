//! `CMake` extension lifecycle
//!
//! Drives one extension target through its phases:
//! ```bash
//! cmake -S csrcs -B csrcs/cmake-build-release -DCMAKE_BUILD_TYPE=Release -G Ninja
//! cmake --build csrcs/cmake-build-release --config release
//! cmake --install csrcs/cmake-build-release
//! stubgen --module python_template._ext --output . --include-docstrings
//! ```
//!
//! Clean runs on its own and removes the build tree plus everything the
//! install step put into the source package.

use super::cleanup::compute_cleanup_actions;
use super::commands;
use super::detector::find_shared_libraries;
use super::error::ExtensionError;
use super::runner::Runner;
use super::target::{ExtensionTarget, Toolchain};
use super::types::{Batch, Phase, PostBuildPolicy};
use crate::output::Console;
use crate::paths::CMAKE_CACHE;
use std::sync::Arc;
use tracing::{debug, info};

/// Message printed when a clean finds nothing to remove
pub const NOTHING_TO_CLEAN: &str = "Nothing to clean.";

/// Lifecycle controller for a single `CMake` extension target
#[derive(Debug)]
pub struct CmakeExtension {
    target: ExtensionTarget,
    toolchain: Toolchain,
    runner: Runner,
}

impl CmakeExtension {
    /// Create a controller writing to `console`
    ///
    /// The target's dry-run flag decides whether commands are executed.
    #[must_use]
    pub fn new(target: ExtensionTarget, toolchain: Toolchain, console: Arc<dyn Console>) -> Self {
        let runner = Runner::new(console, &toolchain, target.is_dry_run());
        Self {
            target,
            toolchain,
            runner,
        }
    }

    /// Target being built
    #[must_use]
    pub const fn target(&self) -> &ExtensionTarget {
        &self.target
    }

    /// Toolchain used for every phase
    #[must_use]
    pub const fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Generate the build tree
    pub async fn configure(&self) -> Result<(), ExtensionError> {
        info!("configuring {}", self.target.module());
        let invocation = commands::configure(&self.target, &self.toolchain);
        self.runner.run_one(&invocation).await
    }

    /// Compile, then install or copy the module into its package
    ///
    /// The copy policy creates the package directory first when it is
    /// missing. Dry runs leave it alone.
    pub async fn build(&self) -> Result<(), ExtensionError> {
        info!("building {}", self.target.module());
        let invocation = commands::build(&self.target, &self.toolchain);
        self.runner.run_one(&invocation).await?;

        let post_build = self.post_build_batch()?;
        if post_build.is_empty() {
            debug!("{}: no post-build commands", self.target.module());
            return Ok(());
        }
        if self.target.post_build() == PostBuildPolicy::Copy && !self.runner.is_dry_run() {
            let package_dir = self.target.package_dir();
            tokio::fs::create_dir_all(&package_dir)
                .await
                .map_err(|source| ExtensionError::io(&package_dir, source))?;
        }
        self.runner.run(&post_build).await
    }

    fn post_build_batch(&self) -> Result<Batch, ExtensionError> {
        let artifacts = match self.target.post_build() {
            PostBuildPolicy::Install => Vec::new(),
            PostBuildPolicy::Copy => {
                let found = find_shared_libraries(self.target.build_dir(), self.toolchain.host)?;
                debug!(
                    "{}: {} artifact(s) to copy",
                    self.target.module(),
                    found.len()
                );
                found
            }
        };
        Ok(commands::post_build(
            &self.target,
            &self.toolchain,
            &artifacts,
        ))
    }

    /// Remove the build tree and everything the build put into the package
    ///
    /// Prints [`NOTHING_TO_CLEAN`] and runs nothing when there is no trace of
    /// a previous build.
    pub async fn clean(&self) -> Result<(), ExtensionError> {
        let actions = compute_cleanup_actions(&self.target, self.toolchain.host)?;
        if actions.is_empty() {
            self.runner.console().note(NOTHING_TO_CLEAN);
            return Ok(());
        }

        info!(
            "cleaning {} ({} path(s))",
            self.target.module(),
            actions.len()
        );

        let mut batch = Batch::new();
        if self.target.build_dir().join(CMAKE_CACHE).is_file() {
            batch.push(commands::clean_target(&self.target, &self.toolchain));
        }
        batch.extend(commands::removals(&actions, &self.toolchain));

        self.runner.run(&batch).await
    }

    /// Generate `.pyi` stubs for the built module
    pub async fn stubgen(&self) -> Result<(), ExtensionError> {
        if !self.target.generates_stubs() {
            debug!("{}: stub generation disabled", self.target.module());
            return Ok(());
        }
        let invocation = commands::stubgen(&self.target, &self.toolchain);
        self.runner.run_one(&invocation).await
    }

    /// Run configure, build and stub generation in order
    ///
    /// Returns the phases that ran. The first failure stops the sequence.
    pub async fn run_default(&self) -> Result<Vec<Phase>, ExtensionError> {
        let mut phases = Vec::with_capacity(3);

        self.configure().await?;
        phases.push(Phase::Configure);

        self.build().await?;
        phases.push(Phase::Build);

        if self.target.generates_stubs() {
            self.stubgen().await?;
            phases.push(Phase::Stubgen);
        }

        Ok(phases)
    }
}
