//! Native extension building
//!
//! Out-of-tree `CMake` builds of Python extension modules: configure, build,
//! install or copy the compiled module into its package, then generate
//! `.pyi` stubs. Clean undoes all of it.
//!
//! Commands are computed by pure functions in [`commands`], executed by the
//! [`Runner`], and sequenced per target by [`CmakeExtension`].

pub mod builder;
pub mod cleanup;
pub mod cmake_extension;
pub mod commands;
pub mod detector;
pub mod error;
pub mod runner;
pub mod target;
pub mod types;

pub use builder::{BuildReport, ExtensionBuilder, Mode, build_extensions};
pub use cleanup::compute_cleanup_actions;
pub use cmake_extension::{CmakeExtension, NOTHING_TO_CLEAN};
pub use detector::{is_shared_library, stub_path_for};
pub use error::ExtensionError;
pub use runner::Runner;
pub use target::{Definitions, ExtensionTarget, TargetOptions, Toolchain, default_definitions};
pub use types::{Batch, BuildResult, CleanupAction, CommandInvocation, Phase, PostBuildPolicy};
