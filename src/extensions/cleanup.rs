//! Cleanup planning
//!
//! Works out what a clean has to remove without removing anything:
//! 1. the build directory itself (recursively)
//! 2. with an install manifest: every installed file it lists plus the `.pyi`
//!    stub next to each one
//! 3. without one: the stubs and shared libraries sitting in the in-tree
//!    package directory (left there by the copy policy)
//!
//! Only paths that exist right now are returned. The plan is recomputed on
//! every clean.

use super::detector::{find_package_artifacts, stub_path_for};
use super::error::ExtensionError;
use super::target::ExtensionTarget;
use super::types::CleanupAction;
use crate::platform::HostFamily;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compute the removal actions that undo a build of `target`
///
/// Returns an empty plan when neither the build directory nor its manifest
/// exists; the caller reports "nothing to clean".
pub fn compute_cleanup_actions(
    target: &ExtensionTarget,
    host: HostFamily,
) -> Result<Vec<CleanupAction>, ExtensionError> {
    let build_dir = target.build_dir();
    let manifest = target.install_manifest();

    let has_build_dir = build_dir.exists();
    let has_manifest = manifest.is_file();

    if !has_build_dir && !has_manifest {
        debug!("{}: no build directory or manifest", target.module());
        return Ok(Vec::new());
    }

    let mut actions = Vec::new();
    if has_build_dir {
        actions.push(CleanupAction::tree(build_dir));
    }

    let artifacts = if has_manifest {
        debug!("{}: cleaning from {}", target.module(), manifest.display());
        manifest_artifacts(&manifest)?
    } else {
        let package_dir = target.package_dir();
        debug!(
            "{}: no manifest, scanning {}",
            target.module(),
            package_dir.display()
        );
        find_package_artifacts(&package_dir, host)?
    };

    let mut seen: HashSet<PathBuf> = actions.iter().map(|a| a.path.clone()).collect();
    for path in artifacts {
        if path.starts_with(build_dir) || !seen.insert(path.clone()) {
            continue;
        }
        actions.push(CleanupAction::file(path));
    }

    Ok(actions)
}

/// Existing files listed in an install manifest, each followed by its stub
///
/// Lines are taken literally; entries that do not exist are skipped.
pub fn manifest_artifacts(manifest: &Path) -> Result<Vec<PathBuf>, ExtensionError> {
    let content = fs::read_to_string(manifest).map_err(|e| ExtensionError::io(manifest, e))?;
    Ok(parse_manifest(&content)
        .into_iter()
        .flat_map(|installed| {
            let stub = stub_path_for(&installed);
            [installed, stub]
        })
        .filter(|path| path.exists())
        .collect())
}

/// Installed paths recorded in manifest `content`, one per non-empty line
#[must_use]
pub fn parse_manifest(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::target::{Definitions, TargetOptions};
    use std::fs;
    use tempfile::TempDir;

    fn target_in(root: &Path) -> ExtensionTarget {
        let mut options = TargetOptions::new("pkg._ext", "csrcs");
        options.build_dir = Some(PathBuf::from("build"));
        ExtensionTarget::new(options, root, &Definitions::new())
    }

    #[test]
    fn parses_manifest_lines() {
        let paths = parse_manifest("/a/x.so\r\n\n/b/y.pyi\n   \n");
        assert_eq!(paths, vec![PathBuf::from("/a/x.so"), PathBuf::from("/b/y.pyi")]);
    }

    #[test]
    fn nothing_to_clean_without_build_dir() {
        let temp = TempDir::new().unwrap();
        let target = target_in(temp.path());

        let actions = compute_cleanup_actions(&target, HostFamily::Unix).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn manifest_entries_and_stubs_are_targeted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let target = target_in(root);
        let pkg = root.join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(target.build_dir()).unwrap();

        let lib = pkg.join("_ext.cpython-310.so");
        let stub = pkg.join("_ext.pyi");
        fs::write(&lib, "").unwrap();
        fs::write(&stub, "").unwrap();
        let gone = pkg.join("missing.so");
        fs::write(
            target.install_manifest(),
            format!("{}\n{}\n", lib.display(), gone.display()),
        )
        .unwrap();

        let actions = compute_cleanup_actions(&target, HostFamily::Unix).unwrap();

        assert_eq!(
            actions,
            vec![
                CleanupAction::tree(target.build_dir()),
                CleanupAction::file(&lib),
                CleanupAction::file(&stub),
            ]
        );
    }

    #[test]
    fn scans_package_without_manifest() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let target = target_in(root);
        let pkg = root.join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(target.build_dir()).unwrap();

        fs::write(pkg.join("__init__.py"), "").unwrap();
        fs::write(pkg.join("_ext.pyi"), "").unwrap();
        fs::write(pkg.join("_ext.cpython-310.so"), "").unwrap();

        let actions = compute_cleanup_actions(&target, HostFamily::Unix).unwrap();

        assert_eq!(
            actions,
            vec![
                CleanupAction::tree(target.build_dir()),
                CleanupAction::file(pkg.join("_ext.cpython-310.so")),
                CleanupAction::file(pkg.join("_ext.pyi")),
            ]
        );
    }

    #[test]
    fn files_inside_build_dir_are_covered_by_tree_removal() {
        let temp = TempDir::new().unwrap();
        let target = target_in(temp.path());
        fs::create_dir_all(target.build_dir()).unwrap();
        let inner = target.build_dir().join("_ext.so");
        fs::write(&inner, "").unwrap();
        fs::write(target.install_manifest(), format!("{}\n", inner.display())).unwrap();

        let actions = compute_cleanup_actions(&target, HostFamily::Unix).unwrap();
        assert_eq!(actions, vec![CleanupAction::tree(target.build_dir())]);
    }

    #[test]
    fn computing_actions_does_not_mutate() {
        let temp = TempDir::new().unwrap();
        let target = target_in(temp.path());
        fs::create_dir_all(target.build_dir()).unwrap();

        let first = compute_cleanup_actions(&target, HostFamily::Unix).unwrap();
        let second = compute_cleanup_actions(&target, HostFamily::Unix).unwrap();

        assert_eq!(first, second);
        assert!(target.build_dir().exists());
    }
}
