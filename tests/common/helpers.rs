//! Shared test helpers and utilities

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to the ext-build binary built for this test run
#[allow(dead_code)]
pub(crate) fn get_ext_build_binary() -> String {
    env!("CARGO_BIN_EXE_ext-build").to_string()
}

/// Create a project with a `.ext-build.toml` and an empty `csrcs/CMakeLists.txt`
///
/// # Returns
/// The path to the created config file
#[allow(dead_code)]
pub(crate) fn create_test_project(temp_dir: &TempDir, config: &str) -> PathBuf {
    let root = temp_dir.path();
    let csrcs = root.join("csrcs");
    fs::create_dir_all(&csrcs).expect("Failed to create csrcs");
    fs::write(
        csrcs.join("CMakeLists.txt"),
        "cmake_minimum_required(VERSION 3.15)\n",
    )
    .expect("Failed to write CMakeLists.txt");

    let config_path = root.join(".ext-build.toml");
    fs::write(&config_path, config).expect("Failed to write config");
    config_path
}

/// Write an executable shell script standing in for an external tool
#[cfg(unix)]
#[allow(dead_code)]
pub(crate) fn create_fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).expect("Failed to create tool dir");
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make tool executable");
    path
}

/// Lines a fake tool appended to its log, or nothing if it never ran
#[allow(dead_code)]
pub(crate) fn read_log(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
