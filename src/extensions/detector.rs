//! Build artifact detection
//!
//! Recognizes the files an extension build leaves behind:
//! - shared native libraries (`.so`/`.dylib` on Unix, `.pyd`/`.dll` on Windows),
//!   usually with an ABI tag such as `_ext.cpython-312-x86_64-linux-gnu.so`
//! - `.pyi` stubs written next to them by the stub generator
//!
//! Scanning is read-only and used both to plan the copy step after a build and
//! to find leftovers during clean.

use super::error::ExtensionError;
use crate::platform::HostFamily;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of generated stub files
pub const STUB_EXTENSION: &str = "pyi";

/// Check if `path` names a shared native library for `host`
#[must_use]
pub fn is_shared_library(path: &Path, host: HostFamily) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            host.shared_library_extensions()
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Check if `path` names a `.pyi` stub
#[must_use]
pub fn is_stub_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == STUB_EXTENSION)
}

/// Sibling stub path for a built module
///
/// Everything in the file name from the first `.` onward is replaced by
/// `.pyi`, which strips both the ABI tag and the library extension:
/// - `/out/mylib.cpython-310.so` -> `/out/mylib.pyi`
/// - `/out/_ext.pyd` -> `/out/_ext.pyi`
#[must_use]
pub fn stub_path_for(artifact: &Path) -> PathBuf {
    let Some(name) = artifact.file_name().map(|n| n.to_string_lossy()) else {
        return artifact.with_extension(STUB_EXTENSION);
    };

    let stem = name.split_once('.').map_or(&*name, |(stem, _)| stem);
    artifact.with_file_name(format!("{stem}.{STUB_EXTENSION}"))
}

/// Shared libraries anywhere below `build_dir`, sorted by path
///
/// `CMakeFiles/` holds compiler probes and object files, never the module
/// itself, so it is skipped.
pub fn find_shared_libraries(
    build_dir: &Path,
    host: HostFamily,
) -> Result<Vec<PathBuf>, ExtensionError> {
    if !build_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(build_dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != "CMakeFiles");

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map_or_else(|| build_dir.to_path_buf(), Path::to_path_buf);
            ExtensionError::io(path, std::io::Error::other(err))
        })?;

        if entry.file_type().is_file() && is_shared_library(entry.path(), host) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// Stubs and shared libraries directly inside `package_dir`, sorted by path
pub fn find_package_artifacts(
    package_dir: &Path,
    host: HostFamily,
) -> Result<Vec<PathBuf>, ExtensionError> {
    if !package_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries =
        std::fs::read_dir(package_dir).map_err(|e| ExtensionError::io(package_dir, e))?;

    let mut found: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| is_stub_file(path) || is_shared_library(path, host))
        .collect();

    found.sort();
    Ok(found)
}
