//! Extension build type definitions
//!
//! The lifecycle of one extension target is split into phases. Each phase
//! turns into a [`Batch`] of [`CommandInvocation`]s that the runner executes
//! in order. Cleanup is described as [`CleanupAction`]s before anything is
//! removed.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::iter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One step of the build lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Generate the build tree (`cmake -S ... -B ...`)
    Configure,
    /// Compile and run the post-build step
    Build,
    /// Undo a previous build
    Clean,
    /// Generate `.pyi` stubs for the built module
    Stubgen,
}

impl Phase {
    /// Label used to tag every output line of this phase
    #[must_use]
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Configure => "[CMAKE]",
            Self::Build => "[BUILD]",
            Self::Clean => "[CLEAN]",
            Self::Stubgen => "[STUB]",
        }
    }

    /// Human-readable phase name
    #[must_use]
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Clean => "clean",
            Self::Stubgen => "stubgen",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happens to the compiled module after `cmake --build`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostBuildPolicy {
    /// Run `cmake --install`, which records `install_manifest.txt`
    #[default]
    Install,
    /// Copy shared libraries from the build tree into the package directory
    Copy,
}

/// A program with its arguments, tagged with the phase it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    phase: Phase,
    argv: Vec<String>,
}

impl CommandInvocation {
    /// Create an invocation from a program and its arguments
    pub fn new<I, S>(phase: Phase, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args.into_iter().map(Into::into));
        Self { phase, argv }
    }

    /// Phase this invocation belongs to
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Program name (first element of the argument vector)
    #[must_use]
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Arguments after the program
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Full argument vector, program first
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Space-joined command line, as printed before execution
    #[must_use]
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Command line for `cmd /C`, with each argument quoted where needed
    ///
    /// Arguments holding whitespace or `"` are wrapped in double quotes and
    /// follow the MSVC argv rules: an embedded quote becomes `\"`, and
    /// backslashes are doubled only when a quote follows them.
    #[must_use]
    pub fn shell_line(&self) -> String {
        self.argv
            .iter()
            .map(|arg| quote_arg(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_arg(arg: &str) -> Cow<'_, str> {
    let needs_quotes = arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"');
    if !needs_quotes {
        return Cow::Borrowed(arg);
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.extend(iter::repeat_n('\\', backslashes * 2 + 1));
                quoted.push('"');
                backslashes = 0;
            }
            _ => {
                quoted.extend(iter::repeat_n('\\', backslashes));
                quoted.push(c);
                backslashes = 0;
            }
        }
    }
    // the closing quote must not be escaped
    quoted.extend(iter::repeat_n('\\', backslashes * 2));
    quoted.push('"');
    Cow::Owned(quoted)
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Ordered sequence of invocations executed strictly in order
///
/// The first failing invocation aborts the rest of the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    invocations: Vec<CommandInvocation>,
}

impl Batch {
    /// Create an empty batch
    #[must_use]
    pub const fn new() -> Self {
        Self {
            invocations: Vec::new(),
        }
    }

    /// Append an invocation
    pub fn push(&mut self, invocation: CommandInvocation) {
        self.invocations.push(invocation);
    }

    /// Whether the batch holds no invocations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Number of invocations
    #[must_use]
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    /// Iterate over the invocations in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, CommandInvocation> {
        self.invocations.iter()
    }
}

impl From<CommandInvocation> for Batch {
    fn from(invocation: CommandInvocation) -> Self {
        Self {
            invocations: vec![invocation],
        }
    }
}

impl FromIterator<CommandInvocation> for Batch {
    fn from_iter<T: IntoIterator<Item = CommandInvocation>>(iter: T) -> Self {
        Self {
            invocations: iter.into_iter().collect(),
        }
    }
}

impl Extend<CommandInvocation> for Batch {
    fn extend<T: IntoIterator<Item = CommandInvocation>>(&mut self, iter: T) {
        self.invocations.extend(iter);
    }
}

impl IntoIterator for Batch {
    type Item = CommandInvocation;
    type IntoIter = std::vec::IntoIter<CommandInvocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.invocations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a CommandInvocation;
    type IntoIter = std::slice::Iter<'a, CommandInvocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.invocations.iter()
    }
}

/// A filesystem entry to remove during clean
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupAction {
    /// File or directory to remove
    pub path: PathBuf,
    /// Remove a directory and everything below it
    pub recursive: bool,
}

impl CleanupAction {
    /// Remove a single file
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
        }
    }

    /// Remove a directory tree
    #[must_use]
    pub fn tree(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
        }
    }

    /// Path this action targets
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of running the lifecycle for one target
#[derive(Debug)]
pub struct BuildResult {
    /// Module identifier of the target
    pub module: String,

    /// Phases that completed
    pub phases: Vec<Phase>,

    /// Time spent on the target
    pub duration: Duration,
}

impl BuildResult {
    /// Create a result for a target whose phases all completed
    #[must_use]
    pub const fn new(module: String, phases: Vec<Phase>, duration: Duration) -> Self {
        Self {
            module,
            phases,
            duration,
        }
    }
}
