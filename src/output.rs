//! Phase-tagged console output
//!
//! Every line the runner emits goes through a [`Console`]: the command
//! header printed before a launch, each line a child writes to stdout or
//! stderr, and plain status notes such as "Nothing to clean.". The terminal
//! console writes everything to the process's stdout and tells the two child
//! streams apart by label color. Without color, stderr labels carry a
//! trailing `!` instead:
//!
//! ```text
//! [CMAKE]    -- Configuring done
//! [CMAKE]!   CMake Warning: ...
//! ```

use crossterm::style::Stylize;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Which stream of the child process a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Child standard output
    Stdout,
    /// Child standard error
    Stderr,
}

/// Sink for runner output
///
/// Implementations must tolerate concurrent calls: both streams of one child
/// are drained at the same time.
pub trait Console: Send + Sync + fmt::Debug {
    /// Announce a command about to run (also called in dry-run mode)
    fn command(&self, label: &str, command_line: &str);

    /// Emit one line read from a child stream
    fn line(&self, label: &str, channel: Channel, text: &str);

    /// Emit a status note that belongs to no child process
    fn note(&self, text: &str);
}

/// Suffix on the label of a child stderr line when color is off
pub const STDERR_MARK: &str = "!";

/// Console that prints to stdout, optionally with ANSI colors
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConsole {
    color: bool,
}

impl TerminalConsole {
    /// Create a terminal console
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    fn format_line(self, label: &str, channel: Channel, text: &str) -> String {
        match (self.color, channel) {
            (true, Channel::Stdout) => format!("{}\t{text}", label.blue()),
            (true, Channel::Stderr) => format!("{}\t{text}", label.red()),
            (false, Channel::Stdout) => format!("{label}\t{text}"),
            (false, Channel::Stderr) => format!("{label}{STDERR_MARK}\t{text}"),
        }
    }
}

impl Console for TerminalConsole {
    fn command(&self, label: &str, command_line: &str) {
        if self.color {
            println!("{}\t{}", label.blue(), command_line.green());
        } else {
            println!("{label}\t{command_line}");
        }
    }

    fn line(&self, label: &str, channel: Channel, text: &str) {
        println!("{}", self.format_line(label, channel, text));
    }

    fn note(&self, text: &str) {
        if self.color {
            println!("{}", text.blue());
        } else {
            println!("{text}");
        }
    }
}

/// A line captured by [`MemoryConsole`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    /// Command header
    Command {
        /// Phase label
        label: String,
        /// Full command line
        command_line: String,
    },
    /// Child output line
    Line {
        /// Phase label
        label: String,
        /// Originating stream
        channel: Channel,
        /// Line text without the trailing newline
        text: String,
    },
    /// Status note
    Note(String),
}

/// Console that records everything in memory
///
/// Cloning shares the same buffer, so a clone handed to a runner can be
/// inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    entries: Arc<Mutex<Vec<Captured>>>,
}

impl MemoryConsole {
    /// Create an empty memory console
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    #[must_use]
    pub fn entries(&self) -> Vec<Captured> {
        let guard = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.clone()
    }

    /// Command lines announced so far, in order
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Captured::Command { command_line, .. } => Some(command_line),
                _ => None,
            })
            .collect()
    }

    /// Text of every child line from `channel`, in arrival order
    #[must_use]
    pub fn lines(&self, channel: Channel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Captured::Line {
                    channel: c, text, ..
                } if c == channel => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Status notes emitted so far
    #[must_use]
    pub fn notes(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Captured::Note(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, entry: Captured) {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.push(entry);
    }
}

impl Console for MemoryConsole {
    fn command(&self, label: &str, command_line: &str) {
        self.push(Captured::Command {
            label: label.to_string(),
            command_line: command_line.to_string(),
        });
    }

    fn line(&self, label: &str, channel: Channel, text: &str) {
        self.push(Captured::Line {
            label: label.to_string(),
            channel,
            text: text.to_string(),
        });
    }

    fn note(&self, text: &str) {
        self.push(Captured::Note(text.to_string()));
    }
}
