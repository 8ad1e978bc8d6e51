//! External command execution
//!
//! Runs a [`Batch`] strictly in order. Each invocation is announced on the
//! console with its phase label before it starts; in dry-run mode that
//! announcement is all that happens. Otherwise both output streams of the
//! child are drained concurrently while it runs, so lines show up as they are
//! written, and a non-zero exit aborts the rest of the batch.

use super::error::ExtensionError;
use super::target::Toolchain;
use super::types::{Batch, CommandInvocation};
use crate::output::{Channel, Console};
use crate::platform::HostFamily;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Executes command batches and streams their output to a [`Console`]
#[derive(Debug, Clone)]
pub struct Runner {
    console: Arc<dyn Console>,
    host: HostFamily,
    search_paths: Vec<PathBuf>,
    dry_run: bool,
}

impl Runner {
    /// Create a runner for `toolchain`'s host and search paths
    #[must_use]
    pub fn new(console: Arc<dyn Console>, toolchain: &Toolchain, dry_run: bool) -> Self {
        Self {
            console,
            host: toolchain.host,
            search_paths: toolchain.search_paths.clone(),
            dry_run,
        }
    }

    /// Console this runner writes to
    #[must_use]
    pub fn console(&self) -> &dyn Console {
        &*self.console
    }

    /// Whether invocations are only announced
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run every invocation in `batch`, stopping at the first failure
    pub async fn run(&self, batch: &Batch) -> Result<(), ExtensionError> {
        for invocation in batch {
            self.run_one(invocation).await?;
        }
        Ok(())
    }

    /// Run a single invocation
    pub async fn run_one(&self, invocation: &CommandInvocation) -> Result<(), ExtensionError> {
        let phase = invocation.phase();
        let label = phase.label();
        let command_line = invocation.command_line();

        self.console.command(label, &command_line);

        if self.dry_run {
            return Ok(());
        }

        let mut command = self.command_for(invocation);
        if let Some(path) = self.child_path()? {
            command.env("PATH", path);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("spawning {command_line}");
        let mut child = command.spawn().map_err(|source| ExtensionError::Spawn {
            phase,
            program: invocation.program().to_string(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let console = &*self.console;

        let ((), (), status) = tokio::join!(
            drain(stdout, console, label, Channel::Stdout),
            drain(stderr, console, label, Channel::Stderr),
            child.wait(),
        );

        let status = status.map_err(|source| ExtensionError::Spawn {
            phase,
            program: invocation.program().to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExtensionError::SubprocessFailure {
                phase,
                exit_code: status.code(),
                command: command_line,
            })
        }
    }

    /// Process to spawn for `invocation`
    ///
    /// On Windows the quoted line goes to `cmd /S /C` inside one more pair of
    /// quotes, which `/S` strips before parsing. It is passed verbatim so the
    /// standard library does not quote it a second time.
    fn command_for(&self, invocation: &CommandInvocation) -> Command {
        if self.host.runs_in_shell() {
            let line = format!("\"{}\"", invocation.shell_line());
            let mut command = Command::new("cmd");
            command.arg("/S").arg("/C");
            #[cfg(windows)]
            command.raw_arg(line);
            #[cfg(not(windows))]
            command.arg(line);
            command
        } else {
            let mut command = Command::new(invocation.program());
            command.args(invocation.args());
            command
        }
    }

    /// `PATH` for children: search paths first, then the inherited value
    fn child_path(&self) -> Result<Option<OsString>, ExtensionError> {
        if self.search_paths.is_empty() {
            return Ok(None);
        }

        let inherited: Vec<PathBuf> = env::var_os("PATH")
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default();

        let joined = env::join_paths(self.search_paths.iter().chain(inherited.iter()))?;
        Ok(Some(joined))
    }
}

/// Forward every line of `stream` to `console` until end of stream
async fn drain<R>(stream: Option<R>, console: &dyn Console, label: &str, channel: Channel)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };

    let mut segments = BufReader::new(stream).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                console.line(label, channel, text.trim_end_matches('\r'));
            }
            Ok(None) => break,
            Err(err) => {
                warn!("stopped reading child {channel:?}: {err}");
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::extensions::types::Phase;
    use crate::output::MemoryConsole;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;
    use tempfile::TempDir;

    fn runner(console: &MemoryConsole, dry_run: bool) -> Runner {
        Runner::new(
            Arc::new(console.clone()),
            &Toolchain::new(HostFamily::Unix),
            dry_run,
        )
    }

    fn shell(phase: Phase, script: &str) -> CommandInvocation {
        CommandInvocation::new(phase, "sh", ["-c", script])
    }

    #[tokio::test]
    async fn dry_run_only_announces() {
        let console = MemoryConsole::new();
        let batch: Batch = [CommandInvocation::new(
            Phase::Configure,
            "no-such-program-ext-build",
            ["-S", "src"],
        )]
        .into_iter()
        .collect();

        runner(&console, true).run(&batch).await.unwrap();

        assert_eq!(console.commands(), vec!["no-such-program-ext-build -S src"]);
        assert!(console.lines(Channel::Stdout).is_empty());
    }

    #[tokio::test]
    async fn streams_both_channels() {
        let console = MemoryConsole::new();
        let batch = Batch::from(shell(Phase::Build, "echo out; echo err 1>&2; printf 'a\\r\\nb'"));

        runner(&console, false).run(&batch).await.unwrap();

        assert_eq!(console.lines(Channel::Stdout), vec!["out", "a", "b"]);
        assert_eq!(console.lines(Channel::Stderr), vec!["err"]);
    }

    #[tokio::test]
    async fn lines_carry_the_phase_label() {
        let console = MemoryConsole::new();
        let batch = Batch::from(shell(Phase::Stubgen, "echo generated"));

        runner(&console, false).run(&batch).await.unwrap();

        let labels: Vec<String> = console
            .entries()
            .into_iter()
            .map(|entry| match entry {
                crate::output::Captured::Command { label, .. }
                | crate::output::Captured::Line { label, .. } => label,
                crate::output::Captured::Note(text) => text,
            })
            .collect();
        assert_eq!(labels, vec!["[STUB]", "[STUB]"]);
    }

    #[tokio::test]
    async fn failure_aborts_the_batch() {
        let console = MemoryConsole::new();
        let batch: Batch = [
            shell(Phase::Configure, "exit 3"),
            shell(Phase::Build, "echo never"),
        ]
        .into_iter()
        .collect();

        let err = runner(&console, false).run(&batch).await.unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Configure));
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(console.commands(), vec!["sh -c exit 3"]);
        assert!(console.lines(Channel::Stdout).is_empty());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let console = MemoryConsole::new();
        let batch = Batch::from(CommandInvocation::new(
            Phase::Stubgen,
            "no-such-program-ext-build",
            Vec::<String>::new(),
        ));

        let err = runner(&console, false).run(&batch).await.unwrap_err();

        assert!(matches!(err, ExtensionError::Spawn { .. }));
        assert_eq!(err.phase(), Some(Phase::Stubgen));
    }

    #[test]
    fn windows_shell_line_quotes_spaced_paths() {
        let console = MemoryConsole::new();
        let runner = Runner::new(
            Arc::new(console),
            &Toolchain::new(HostFamily::Windows),
            false,
        );
        let invocation = CommandInvocation::new(
            Phase::Configure,
            "cmake",
            [
                "-S",
                r"C:\My Projects\csrcs",
                r"-Dpybind11_DIR=C:\Program Files\Python311\pybind11",
            ],
        );

        let command = runner.command_for(&invocation);

        let std_command = command.as_std();
        assert_eq!(std_command.get_program(), "cmd");
        let args: Vec<_> = std_command.get_args().collect();
        assert_eq!(
            args,
            [
                "/S",
                "/C",
                r#""cmake -S "C:\My Projects\csrcs" "-Dpybind11_DIR=C:\Program Files\Python311\pybind11"""#,
            ]
        );
    }

    #[test]
    fn unix_children_get_argv_directly() {
        let console = MemoryConsole::new();
        let invocation =
            CommandInvocation::new(Phase::Clean, "rm", ["-r", "/tmp/my project/build"]);

        let command = runner(&console, false).command_for(&invocation);

        let std_command = command.as_std();
        assert_eq!(std_command.get_program(), "rm");
        let args: Vec<_> = std_command.get_args().collect();
        assert_eq!(args, ["-r", "/tmp/my project/build"]);
    }

    #[tokio::test]
    async fn large_stderr_does_not_block_stdout() {
        // ~200 KiB on stderr before anything reaches stdout, well past a pipe buffer
        let console = MemoryConsole::new();
        let script = "i=0; while [ $i -lt 2000 ]; do \
                      echo \"warning $i: ........................................................................................\" 1>&2; \
                      i=$((i+1)); done; echo finished";
        let batch = Batch::from(shell(Phase::Build, script));

        tokio::time::timeout(Duration::from_secs(60), runner(&console, false).run(&batch))
            .await
            .unwrap()
            .unwrap();

        let stderr = console.lines(Channel::Stderr);
        assert_eq!(stderr.len(), 2000);
        assert!(stderr.first().is_some_and(|l| l.starts_with("warning 0: ")));
        assert!(stderr.last().is_some_and(|l| l.starts_with("warning 1999: ")));
        assert_eq!(console.lines(Channel::Stdout), vec!["finished"]);
    }

    #[tokio::test]
    async fn search_paths_are_visible_to_children() {
        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("ext-build-probe");
        fs::write(&tool, "#!/bin/sh\necho probe-ok\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let console = MemoryConsole::new();
        let toolchain = Toolchain::new(HostFamily::Unix).with_search_path(temp.path());
        let runner = Runner::new(Arc::new(console.clone()), &toolchain, false);
        let batch = Batch::from(CommandInvocation::new(
            Phase::Build,
            "ext-build-probe",
            Vec::<String>::new(),
        ));

        runner.run(&batch).await.unwrap();

        assert_eq!(console.lines(Channel::Stdout), vec!["probe-ok"]);
        assert!(
            env::var_os("PATH")
                .is_none_or(|path| !env::split_paths(&path).any(|dir| dir == temp.path()))
        );
    }
}
