//! Configuration file management
//!
//! Extension targets and toolchain settings come from a TOML file:
//!
//! ```toml
//! [toolchain]
//! cmake = "cmake"
//! search_paths = ["tools/ninja"]
//!
//! [[extension]]
//! module = "python_template._ext"
//! source_dir = "csrcs"
//! post_build = "install"
//!
//! [extension.definitions]
//! BUILD_TESTING = "OFF"
//! ```
//!
//! Relative paths are resolved against the directory holding the file, which
//! is treated as the project root.

use crate::extensions::target::{
    DEFAULT_CMAKE, DEFAULT_GENERATOR, DEFAULT_STUBGEN, Definitions, ExtensionTarget,
    TargetOptions, Toolchain, default_definitions,
};
use crate::extensions::types::PostBuildPolicy;
use crate::paths::{self, PROJECT_CONFIG_FILE};
use crate::platform::HostFamily;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration loaded from TOML files
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// External tool settings
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Extension targets, built in listed order
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionConfig>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    root: Option<PathBuf>,
}

/// `[toolchain]` table
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub cmake: Option<String>,
    #[serde(default)]
    pub stubgen: Option<String>,
    #[serde(default)]
    pub generator: Option<String>,
    /// Directories prepended to `PATH` for every command
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

/// One `[[extension]]` entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtensionConfig {
    /// Dotted module identifier
    pub module: String,
    /// Directory holding `CMakeLists.txt`
    pub source_dir: PathBuf,
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
    #[serde(default)]
    pub post_build: PostBuildPolicy,
    #[serde(default = "default_stubgen")]
    pub stubgen: bool,
    /// Extra `-D` definitions, passed in file order
    #[serde(default)]
    pub definitions: Definitions,
}

const fn default_stubgen() -> bool {
    true
}

/// Toolchain values that take priority over the config file
#[derive(Debug, Clone, Default)]
pub struct ToolchainOverrides {
    pub cmake: Option<String>,
    pub stubgen: Option<String>,
    pub generator: Option<String>,
    /// Appended after the configured search paths
    pub search_paths: Vec<PathBuf>,
}

impl ToolchainOverrides {
    /// Overrides from `CMAKE`, `EXT_BUILD_STUBGEN`, `EXT_BUILD_GENERATOR`
    /// and `EXT_BUILD_SEARCH_PATH`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            cmake: crate::env_vars::cmake(),
            stubgen: crate::env_vars::stubgen(),
            generator: crate::env_vars::generator(),
            search_paths: crate::env_vars::search_paths(),
        }
    }
}

impl Config {
    /// Load configuration from the default TOML files.
    /// Priority: ./.ext-build.toml -> $XDG_CONFIG_HOME/ext-build/config.toml
    /// -> ~/.config/ext-build/config.toml
    pub fn load() -> Result<Self> {
        Self::load_with_options(None)
    }

    /// Load configuration, preferring `custom_path` when given.
    ///
    /// Priority: `custom_path` (`--config` or `EXT_BUILD_CONFIG`) ->
    /// ./.ext-build.toml -> $XDG_CONFIG_HOME/ext-build/config.toml ->
    /// ~/.config/ext-build/config.toml. The home fallback applies only when
    /// `XDG_CONFIG_HOME` is unset or empty.
    ///
    /// A missing custom file is an error; missing default files are not.
    /// A file that exists but does not parse is always an error.
    pub fn load_with_options(custom_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = custom_path {
            return Self::load_from(path);
        }

        let local = paths::current_dir().join(PROJECT_CONFIG_FILE);
        if local.is_file() {
            return Self::load_from(&local);
        }

        if let Some(config_dir) = Self::user_config_dir() {
            let config_path = config_dir.join("config.toml");
            if config_path.is_file() {
                // A user-wide file describes no particular project.
                let mut config = Self::load_from(&config_path)?;
                config.root = None;
                return Ok(config);
            }
        }

        debug!("no config file found");
        Ok(Self::default())
    }

    /// Load and parse a single config file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = paths::absolutize(path.as_ref(), paths::current_dir());
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        debug!(
            "loaded {} ({} extension(s))",
            path.display(),
            config.extensions.len()
        );
        config.root = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    fn user_config_dir() -> Option<PathBuf> {
        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(xdg_config).join("ext-build"));
        }

        dirs::home_dir().map(|home| home.join(".config").join("ext-build"))
    }

    /// Project root: the config file's directory, or the working directory
    #[must_use]
    pub fn project_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(paths::current_dir)
    }

    /// Toolchain for `host` with environment overrides applied
    #[must_use]
    pub fn toolchain(&self, host: HostFamily) -> Toolchain {
        self.toolchain_with(host, &ToolchainOverrides::from_env())
    }

    /// Toolchain for `host` with explicit overrides applied
    ///
    /// Priority per tool: override, config file, built-in default.
    #[must_use]
    pub fn toolchain_with(&self, host: HostFamily, overrides: &ToolchainOverrides) -> Toolchain {
        let settings = &self.toolchain;
        let pick = |over: &Option<String>, configured: &Option<String>, default: &str| {
            over.clone()
                .or_else(|| configured.clone())
                .unwrap_or_else(|| default.to_string())
        };

        let root = self.project_root();
        let search_paths = settings
            .search_paths
            .iter()
            .map(|dir| paths::absolutize(dir, &root))
            .chain(overrides.search_paths.iter().cloned())
            .collect();

        Toolchain {
            cmake: pick(&overrides.cmake, &settings.cmake, DEFAULT_CMAKE),
            stubgen: pick(&overrides.stubgen, &settings.stubgen, DEFAULT_STUBGEN),
            generator: pick(&overrides.generator, &settings.generator, DEFAULT_GENERATOR),
            host,
            search_paths,
        }
    }

    /// Build targets from the configured extensions, merging the detected
    /// default definitions
    pub fn targets(&self, dry_run: bool) -> Result<Vec<ExtensionTarget>> {
        self.targets_with(dry_run, &default_definitions())
    }

    /// Build targets using `defaults` as the default definitions
    pub fn targets_with(
        &self,
        dry_run: bool,
        defaults: &Definitions,
    ) -> Result<Vec<ExtensionTarget>> {
        if self.extensions.is_empty() {
            bail!(
                "No extensions configured. Add an [[extension]] table to {}",
                PROJECT_CONFIG_FILE
            );
        }

        let root = self.project_root();
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(self.extensions.len());

        for ext in &self.extensions {
            if !paths::is_valid_module(&ext.module) {
                bail!("Invalid module name '{}'", ext.module);
            }
            if !seen.insert(ext.module.as_str()) {
                bail!("Extension '{}' is configured more than once", ext.module);
            }

            let options = TargetOptions {
                module: ext.module.clone(),
                source_dir: ext.source_dir.clone(),
                build_dir: ext.build_dir.clone(),
                definitions: ext.definitions.clone(),
                post_build: ext.post_build,
                stubgen: ext.stubgen,
                dry_run,
            };
            targets.push(ExtensionTarget::new(options, &root, defaults));
        }

        Ok(targets)
    }
}
