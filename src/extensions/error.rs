//! Errors raised while driving an extension build

use super::types::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a phase, and with it the rest of the run
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// An external command ran and exited unsuccessfully
    #[error("{phase} failed: `{command}` exited with {}", describe_exit(.exit_code))]
    SubprocessFailure {
        phase: Phase,
        /// `None` when the process was terminated by a signal
        exit_code: Option<i32>,
        command: String,
    },

    #[error("{phase}: failed to run `{program}`: {source}")]
    Spawn {
        phase: Phase,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid executable search path: {0}")]
    SearchPath(#[from] std::env::JoinPathsError),
}

impl ExtensionError {
    /// Phase that failed, if the error came from a command
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match self {
            Self::SubprocessFailure { phase, .. } | Self::Spawn { phase, .. } => Some(*phase),
            Self::Io { .. } | Self::SearchPath(_) => None,
        }
    }

    /// Exit code of the failed command, if it exited normally
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::SubprocessFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[allow(clippy::ref_option)]
fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("exit code {c}"))
}
