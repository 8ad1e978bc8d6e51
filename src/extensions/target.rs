//! Extension targets and the toolchain that builds them
//!
//! A target is fixed at construction: paths are made absolute once and the
//! default `CMake` definitions are merged into the target's own copy of the
//! caller's definitions, never overriding a key the caller supplied.

use super::types::PostBuildPolicy;
use crate::paths::{self, DEFAULT_BUILD_DIR};
use crate::platform::HostFamily;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::debug;

/// Ordered `-D` definitions passed to the configure step
pub type Definitions = IndexMap<String, String>;

/// Default configure tool
pub const DEFAULT_CMAKE: &str = "cmake";

/// Default stub generator
pub const DEFAULT_STUBGEN: &str = "stubgen";

/// Generator selected on hosts that support it
pub const DEFAULT_GENERATOR: &str = "Ninja";

/// pybind11 `CMake` directory, detected once per process
static PYBIND11_CMAKE_DIR: LazyLock<Option<String>> = LazyLock::new(detect_pybind11_dir);

/// Definitions merged into every target unless the caller already set them
///
/// - `CMAKE_EXPORT_COMPILE_COMMANDS=ON` for editor tooling
/// - `pybind11_DIR` so `find_package(pybind11 CONFIG)` resolves without a
///   system-wide install (omitted when pybind11 cannot be located)
#[must_use]
pub fn default_definitions() -> Definitions {
    let mut defaults = Definitions::new();
    defaults.insert("CMAKE_EXPORT_COMPILE_COMMANDS".to_string(), "ON".to_string());
    if let Some(dir) = PYBIND11_CMAKE_DIR.as_ref() {
        defaults.insert("pybind11_DIR".to_string(), dir.clone());
    }
    defaults
}

fn detect_pybind11_dir() -> Option<String> {
    if let Some(dir) = crate::env_vars::pybind11_dir() {
        return Some(dir);
    }

    let python = HostFamily::current().python_command();
    let output = Command::new(python)
        .args(["-m", "pybind11", "--cmakedir"])
        .output()
        .ok()?;

    output.status.success().then_some(())?;

    let dir = String::from_utf8(output.stdout).ok()?.trim().to_string();
    debug!("pybind11 CMake dir from {python}: {dir}");

    (!dir.is_empty()).then_some(dir)
}

/// Merge `defaults` into `definitions` without replacing caller keys
///
/// Caller entries keep their order; defaults that were missing are appended
/// in their own order.
#[must_use]
pub fn merge_definitions(definitions: &Definitions, defaults: &Definitions) -> Definitions {
    let mut merged = definitions.clone();
    for (key, value) in defaults {
        merged
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
    merged
}

/// External tools used to build targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Configure and build tool (`cmake`)
    pub cmake: String,
    /// Stub generator
    pub stubgen: String,
    /// `CMake` generator, used only where the host selects one
    pub generator: String,
    /// Host family selecting command shapes
    pub host: HostFamily,
    /// Directories prepended to `PATH` for child processes
    pub search_paths: Vec<PathBuf>,
}

impl Toolchain {
    /// Toolchain with default tool names for `host`
    #[must_use]
    pub fn new(host: HostFamily) -> Self {
        Self {
            cmake: DEFAULT_CMAKE.to_string(),
            stubgen: DEFAULT_STUBGEN.to_string(),
            generator: DEFAULT_GENERATOR.to_string(),
            host,
            search_paths: Vec::new(),
        }
    }

    /// Use a different configure tool
    #[must_use]
    pub fn with_cmake(mut self, cmake: impl Into<String>) -> Self {
        self.cmake = cmake.into();
        self
    }

    /// Use a different stub generator
    #[must_use]
    pub fn with_stubgen(mut self, stubgen: impl Into<String>) -> Self {
        self.stubgen = stubgen.into();
        self
    }

    /// Use a different generator
    #[must_use]
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Add a directory to the child search path
    #[must_use]
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(HostFamily::current())
    }
}

/// Everything needed to construct an [`ExtensionTarget`]
///
/// Relative paths are resolved against `project_root`.
#[derive(Debug, Clone)]
pub struct TargetOptions {
    /// Dotted module identifier, e.g. `python_template._ext`
    pub module: String,
    /// Directory holding `CMakeLists.txt`
    pub source_dir: PathBuf,
    /// Build directory, `<source_dir>/cmake-build-release` when `None`
    pub build_dir: Option<PathBuf>,
    /// Caller-supplied `-D` definitions
    pub definitions: Definitions,
    /// Post-build policy
    pub post_build: PostBuildPolicy,
    /// Run the stub generator after building
    pub stubgen: bool,
    /// Only print commands
    pub dry_run: bool,
}

impl TargetOptions {
    /// Options with defaults for everything but the module and source directory
    #[must_use]
    pub fn new(module: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            source_dir: source_dir.into(),
            build_dir: None,
            definitions: Definitions::new(),
            post_build: PostBuildPolicy::default(),
            stubgen: true,
            dry_run: false,
        }
    }
}

/// One buildable extension module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTarget {
    module: String,
    project_root: PathBuf,
    source_dir: PathBuf,
    build_dir: PathBuf,
    definitions: Definitions,
    post_build: PostBuildPolicy,
    stubgen: bool,
    dry_run: bool,
}

impl ExtensionTarget {
    /// Resolve `options` against `project_root` and merge `defaults`
    #[must_use]
    pub fn new(options: TargetOptions, project_root: &Path, defaults: &Definitions) -> Self {
        let project_root = paths::absolutize(project_root, paths::current_dir());
        let source_dir = paths::absolutize(&options.source_dir, &project_root);
        let build_dir = options.build_dir.as_ref().map_or_else(
            || source_dir.join(DEFAULT_BUILD_DIR),
            |dir| paths::absolutize(dir, &project_root),
        );
        let definitions = merge_definitions(&options.definitions, defaults);

        debug!(
            "target {}: source={} build={} post_build={:?}",
            options.module,
            source_dir.display(),
            build_dir.display(),
            options.post_build
        );

        Self {
            module: options.module,
            project_root,
            source_dir,
            build_dir,
            definitions,
            post_build: options.post_build,
            stubgen: options.stubgen,
            dry_run: options.dry_run,
        }
    }

    /// Dotted module identifier
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Project root (stub output root)
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute source directory
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Absolute build directory
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Merged `-D` definitions in configure order
    #[must_use]
    pub const fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// Post-build policy
    #[must_use]
    pub const fn post_build(&self) -> PostBuildPolicy {
        self.post_build
    }

    /// Whether stubs are generated for this target
    #[must_use]
    pub const fn generates_stubs(&self) -> bool {
        self.stubgen
    }

    /// Whether commands are only printed
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// In-tree package directory the module is installed or copied into
    #[must_use]
    pub fn package_dir(&self) -> PathBuf {
        paths::package_dir(&self.project_root, &self.module)
    }

    /// Path of the manifest `cmake --install` records
    #[must_use]
    pub fn install_manifest(&self) -> PathBuf {
        self.build_dir.join(paths::INSTALL_MANIFEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(pairs: &[(&str, &str)]) -> Definitions {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn caller_definitions_win() {
        let caller = defs(&[("CMAKE_EXPORT_COMPILE_COMMANDS", "OFF"), ("FOO", "1")]);
        let defaults = defs(&[
            ("CMAKE_EXPORT_COMPILE_COMMANDS", "ON"),
            ("pybind11_DIR", "/py/share/cmake"),
        ]);

        let merged = merge_definitions(&caller, &defaults);

        assert_eq!(merged["CMAKE_EXPORT_COMPILE_COMMANDS"], "OFF");
        assert_eq!(merged["FOO"], "1");
        assert_eq!(merged["pybind11_DIR"], "/py/share/cmake");
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, ["CMAKE_EXPORT_COMPILE_COMMANDS", "FOO", "pybind11_DIR"]);
    }

    #[test]
    fn targets_do_not_share_definitions() {
        let root = paths::current_dir();
        let defaults = defs(&[("CMAKE_EXPORT_COMPILE_COMMANDS", "ON")]);

        let mut first = TargetOptions::new("pkg._a", "a");
        first.definitions = defs(&[("ONLY_A", "1")]);
        let second = TargetOptions::new("pkg._b", "b");

        let a = ExtensionTarget::new(first, &root, &defaults);
        let b = ExtensionTarget::new(second, &root, &defaults);

        assert!(a.definitions().contains_key("ONLY_A"));
        assert!(!b.definitions().contains_key("ONLY_A"));
        assert_eq!(defaults.len(), 1);
    }

    #[test]
    fn build_dir_defaults_below_source() {
        let root = paths::current_dir();
        let target = ExtensionTarget::new(
            TargetOptions::new("python_template._ext", "csrcs"),
            &root,
            &Definitions::new(),
        );

        assert!(target.source_dir().is_absolute());
        assert!(target.build_dir().is_absolute());
        assert_eq!(
            target.build_dir(),
            target.source_dir().join("cmake-build-release")
        );
        assert_eq!(target.package_dir(), root.join("python_template"));
        assert_eq!(
            target.install_manifest(),
            target.build_dir().join("install_manifest.txt")
        );
    }

    #[test]
    fn explicit_build_dir_is_resolved_against_root() {
        let root = paths::current_dir();
        let mut options = TargetOptions::new("pkg._ext", "csrcs");
        options.build_dir = Some(PathBuf::from("out"));

        let target = ExtensionTarget::new(options, &root, &Definitions::new());
        assert_eq!(target.build_dir(), root.join("out"));
    }

    #[test]
    fn default_definitions_export_compile_commands() {
        let defaults = default_definitions();
        assert_eq!(
            defaults.get("CMAKE_EXPORT_COMPILE_COMMANDS").map(String::as_str),
            Some("ON")
        );
    }

    #[test]
    fn toolchain_builders() {
        let toolchain = Toolchain::new(HostFamily::Unix)
            .with_cmake("/opt/cmake/bin/cmake")
            .with_stubgen("pybind11-stubgen")
            .with_generator("Unix Makefiles")
            .with_search_path("/opt/ninja");

        assert_eq!(toolchain.cmake, "/opt/cmake/bin/cmake");
        assert_eq!(toolchain.stubgen, "pybind11-stubgen");
        assert_eq!(toolchain.generator, "Unix Makefiles");
        assert_eq!(toolchain.search_paths, vec![PathBuf::from("/opt/ninja")]);
    }
}
