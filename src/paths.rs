//! Path utilities for project roots and in-tree package directories.

use std::path::{Path, PathBuf};

/// Name of the project config file looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".ext-build.toml";

/// Build directory used when a target does not name one.
pub const DEFAULT_BUILD_DIR: &str = "cmake-build-release";

/// File `cmake --install` writes into the build directory.
pub const INSTALL_MANIFEST: &str = "install_manifest.txt";

/// File whose presence marks a configured build directory.
pub const CMAKE_CACHE: &str = "CMakeCache.txt";

/// Make `path` absolute, resolving relative paths against `base`.
/// The path does not need to exist.
#[must_use]
pub fn absolutize(path: impl AsRef<Path>, base: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let joined = base.as_ref().join(path);
    std::path::absolute(&joined).unwrap_or(joined)
}

/// Absolute form of the current working directory (falls back to ".").
#[must_use]
pub fn current_dir() -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|dir| std::path::absolute(dir).ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// In-tree package directory for a dotted module path.
///
/// All components except the last name nested directories below the
/// project root: `pkg.sub._ext` lives in `<root>/pkg/sub`. A top-level
/// module lives directly in the root.
#[must_use]
pub fn package_dir(project_root: &Path, module: &str) -> PathBuf {
    let mut parts: Vec<&str> = module.split('.').filter(|p| !p.is_empty()).collect();
    parts.pop();

    parts
        .into_iter()
        .fold(project_root.to_path_buf(), |dir, part| dir.join(part))
}

/// Check that a module identifier is a non-empty dotted path of identifiers.
#[must_use]
pub fn is_valid_module(module: &str) -> bool {
    !module.is_empty()
        && module.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        })
}
