//! Environment variable overrides.

use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

// Helper for boolean environment variables that accept "1", "true", "yes"
fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| is_truthy(&s))
}

fn is_truthy(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "1" || value == "true" || value == "yes"
}

fn parse_search_paths(raw: &OsStr) -> Vec<PathBuf> {
    env::split_paths(raw)
        .filter(|path| !path.as_os_str().is_empty())
        .collect()
}

/// Get the configure tool override (`CMAKE`).
pub fn cmake() -> Option<String> {
    env::var("CMAKE").ok().filter(|s| !s.is_empty())
}

/// Get the stub generator override (`EXT_BUILD_STUBGEN`).
pub fn stubgen() -> Option<String> {
    env::var("EXT_BUILD_STUBGEN").ok().filter(|s| !s.is_empty())
}

/// Get the `CMake` generator override (`EXT_BUILD_GENERATOR`).
pub fn generator() -> Option<String> {
    env::var("EXT_BUILD_GENERATOR")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Get extra executable search paths (`EXT_BUILD_SEARCH_PATH`, platform path-list syntax).
pub fn search_paths() -> Vec<PathBuf> {
    env::var_os("EXT_BUILD_SEARCH_PATH")
        .map(|raw| parse_search_paths(&raw))
        .unwrap_or_default()
}

/// Get the pybind11 `CMake` package directory (`PYBIND11_DIR`).
pub fn pybind11_dir() -> Option<String> {
    env::var("PYBIND11_DIR").ok().filter(|s| !s.is_empty())
}

/// Get the config file path (`EXT_BUILD_CONFIG`).
pub fn config_path() -> Option<String> {
    env::var("EXT_BUILD_CONFIG").ok().filter(|s| !s.is_empty())
}

/// Check if colored output is disabled (`NO_COLOR` set to anything non-empty).
pub fn no_color() -> bool {
    env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}

/// Check if dry-run mode is forced (`EXT_BUILD_DRY_RUN`).
pub fn dry_run() -> bool {
    is_enabled("EXT_BUILD_DRY_RUN")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back() {
        // These names are never set by the test harness
        assert!(!is_enabled("EXT_BUILD_TEST_UNSET_FLAG"));
        assert!(env::var("EXT_BUILD_TEST_UNSET_FLAG").is_err());
    }

    #[test]
    fn path_variable_is_not_a_flag() {
        // PATH is set in every test environment but never to a boolean word
        assert!(!is_enabled("PATH"));
    }

    #[test]
    fn truthy_words() {
        for value in ["1", "true", "TRUE", "yes", "Yes"] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["", "0", "false", "no", "on", " 1"] {
            assert!(!is_truthy(value), "{value}");
        }
    }

    #[test]
    fn search_paths_split_on_the_platform_separator() {
        let dirs = [PathBuf::from("/opt/tools/bin"), PathBuf::from("/home/a b/.local/bin")];
        let raw = env::join_paths(&dirs).unwrap();

        assert_eq!(parse_search_paths(&raw), dirs);
    }

    #[test]
    fn empty_search_path_entries_are_dropped() {
        assert!(parse_search_paths(OsStr::new("")).is_empty());

        let sep = if cfg!(windows) { ";" } else { ":" };
        let raw = format!("{sep}/opt/tools/bin{sep}");
        assert_eq!(
            parse_search_paths(OsStr::new(&raw)),
            [PathBuf::from("/opt/tools/bin")]
        );
    }
}
