//! Command lines for each phase
//!
//! Pure functions: nothing here touches the filesystem or spawns anything.
//! Directory scans the copy policy and clean need happen in the caller and
//! are passed in.
//!
//! ```bash
//! cmake -S <src> -B <build> -DCMAKE_BUILD_TYPE=Release [-G Ninja] -D<k>=<v>...
//! cmake --build <build> --config release
//! cmake --install <build>            # or: cp <artifact> <package dir>
//! stubgen --module <module> --output <project root> --include-docstrings
//! ```

use super::target::{ExtensionTarget, Toolchain};
use super::types::{Batch, CleanupAction, CommandInvocation, Phase, PostBuildPolicy};
use std::path::{Path, PathBuf};

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Configure invocation
///
/// Definitions follow the fixed arguments in the target's mapping order.
#[must_use]
pub fn configure(target: &ExtensionTarget, toolchain: &Toolchain) -> CommandInvocation {
    let mut args = vec![
        "-S".to_string(),
        path_arg(target.source_dir()),
        "-B".to_string(),
        path_arg(target.build_dir()),
        "-DCMAKE_BUILD_TYPE=Release".to_string(),
    ];

    if toolchain.host.selects_generator() {
        args.push("-G".to_string());
        args.push(toolchain.generator.clone());
    }

    args.extend(
        target
            .definitions()
            .iter()
            .map(|(key, value)| format!("-D{key}={value}")),
    );

    CommandInvocation::new(Phase::Configure, toolchain.cmake.as_str(), args)
}

/// Build invocation
#[must_use]
pub fn build(target: &ExtensionTarget, toolchain: &Toolchain) -> CommandInvocation {
    CommandInvocation::new(
        Phase::Build,
        toolchain.cmake.as_str(),
        [
            "--build".to_string(),
            path_arg(target.build_dir()),
            "--config".to_string(),
            "release".to_string(),
        ],
    )
}

/// Post-build invocations for the target's policy
///
/// `artifacts` are the shared libraries found in the build tree; only the
/// copy policy uses them. The copy destination keeps the artifact's file
/// name, so running the batch twice leaves the package directory unchanged.
/// The package directory must exist before the copies run.
#[must_use]
pub fn post_build(
    target: &ExtensionTarget,
    toolchain: &Toolchain,
    artifacts: &[PathBuf],
) -> Batch {
    match target.post_build() {
        PostBuildPolicy::Install => CommandInvocation::new(
            Phase::Build,
            toolchain.cmake.as_str(),
            ["--install".to_string(), path_arg(target.build_dir())],
        )
        .into(),
        PostBuildPolicy::Copy => {
            let package_dir = target.package_dir();
            artifacts
                .iter()
                .filter_map(|artifact| {
                    let name = artifact.file_name()?;
                    Some(copy(toolchain, artifact, &package_dir.join(name)))
                })
                .collect()
        }
    }
}

fn copy(toolchain: &Toolchain, from: &Path, to: &Path) -> CommandInvocation {
    let (program, flags) = split_program(toolchain.host.copy_command());
    let mut args: Vec<String> = flags.iter().map(|f| (*f).to_string()).collect();
    args.push(path_arg(from));
    args.push(path_arg(to));
    CommandInvocation::new(Phase::Build, program, args)
}

/// Stub generation invocation
#[must_use]
pub fn stubgen(target: &ExtensionTarget, toolchain: &Toolchain) -> CommandInvocation {
    CommandInvocation::new(
        Phase::Stubgen,
        toolchain.stubgen.as_str(),
        [
            "--module".to_string(),
            target.module().to_string(),
            "--output".to_string(),
            path_arg(target.project_root()),
            "--include-docstrings".to_string(),
        ],
    )
}

/// Build tool's `clean` target
#[must_use]
pub fn clean_target(target: &ExtensionTarget, toolchain: &Toolchain) -> CommandInvocation {
    CommandInvocation::new(
        Phase::Clean,
        toolchain.cmake.as_str(),
        [
            "--build".to_string(),
            path_arg(target.build_dir()),
            "--target".to_string(),
            "clean".to_string(),
        ],
    )
}

/// Removal invocation for one cleanup action
#[must_use]
pub fn remove(action: &CleanupAction, toolchain: &Toolchain) -> CommandInvocation {
    let command = if action.recursive {
        toolchain.host.remove_dir_command()
    } else {
        toolchain.host.remove_file_command()
    };
    let (program, flags) = split_program(command);
    let mut args: Vec<String> = flags.iter().map(|f| (*f).to_string()).collect();
    args.push(path_arg(action.path()));
    CommandInvocation::new(Phase::Clean, program, args)
}

/// Removal invocations for `actions`, in order
#[must_use]
pub fn removals(actions: &[CleanupAction], toolchain: &Toolchain) -> Batch {
    actions
        .iter()
        .map(|action| remove(action, toolchain))
        .collect()
}

fn split_program(command: &'static [&'static str]) -> (&'static str, &'static [&'static str]) {
    match command.split_first() {
        Some((program, flags)) => (*program, flags),
        None => ("", &[]),
    }
}
