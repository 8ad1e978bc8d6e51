//! Host platform detection
//!
//! Decides which command shapes to emit: Windows hosts run commands through
//! `cmd /C`, use `del`/`rmdir`/`copy`, and let `CMake` pick its default
//! generator. Everything else runs commands directly and selects Ninja.

use std::env;
use std::fmt;

/// Host family that selects command shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    /// Windows (`cmd.exe` shell, `.pyd` modules)
    Windows,
    /// Linux, macOS and the BSDs
    Unix,
}

impl HostFamily {
    /// Detect the family of the running host
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(env::consts::OS)
    }

    /// Map a Rust `target_os` name to a host family
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        if os == "windows" {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Whether invocations must go through the platform shell
    ///
    /// Some build tools are shell-resolved scripts on Windows.
    #[must_use]
    #[inline]
    pub const fn runs_in_shell(self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Whether `CMake` should be told to use the fast-build generator
    #[must_use]
    #[inline]
    pub const fn selects_generator(self) -> bool {
        matches!(self, Self::Unix)
    }

    /// Program and flags that remove a single file
    #[must_use]
    pub const fn remove_file_command(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["del", "/F", "/Q"],
            Self::Unix => &["rm"],
        }
    }

    /// Program and flags that remove a directory tree
    #[must_use]
    pub const fn remove_dir_command(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["rmdir", "/S", "/Q"],
            Self::Unix => &["rm", "-r"],
        }
    }

    /// Program and flags that copy a file over an existing one
    #[must_use]
    pub const fn copy_command(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["copy", "/Y"],
            Self::Unix => &["cp"],
        }
    }

    /// File extensions that mark a shared native library loadable by Python
    #[must_use]
    pub const fn shared_library_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["pyd", "dll"],
            Self::Unix => &["so", "dylib"],
        }
    }

    /// Python interpreter used to query helper packages
    #[must_use]
    pub const fn python_command(self) -> &'static str {
        match self {
            Self::Windows => "python",
            Self::Unix => "python3",
        }
    }
}

impl fmt::Display for HostFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => f.write_str("windows"),
            Self::Unix => f.write_str("unix"),
        }
    }
}
