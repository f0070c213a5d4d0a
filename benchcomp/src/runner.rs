//! Running benchmark processes.
//!
//! Benchmarks run one at a time: the runner spawns a command, captures its
//! output and waits for it to exit. If the user interrupts benchcomp while a
//! benchmark is running, the child is killed and reaped before the
//! interruption is reported.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::signal;
use tracing::{debug, warn};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The command line has no program.
    #[error("Empty command")]
    EmptyCommand,

    /// The program could not be started.
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// IO error while collecting output.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The user interrupted the run; the child has been killed.
    #[error("Interrupted while running {command}")]
    Interrupted { command: String },
}

/// A command to run: program and arguments, extra environment and working
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can run a command to completion.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    /// Run `spec` and wait for it to finish.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::exit_code`].
    async fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError>;
}

/// Runs commands as child processes of this one.
#[derive(Debug, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for CommandRunner {
    async fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        let (program, args) = spec.argv.split_first().ok_or(RunnerError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(spec.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        debug!(command = %spec, cwd = ?spec.cwd, "Spawning");
        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            command: spec.to_string(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

        // The child shares our process group and usually dies of the same
        // SIGINT, so the interrupt has to win over its exit.
        let finished = tokio::select! {
            biased;
            interrupt = signal::ctrl_c() => {
                interrupt?;
                None
            }
            result = wait_with_output(&mut child, stdout, stderr) => Some(result?),
        };

        match finished {
            Some((status, stdout, stderr)) => {
                debug!(command = %spec, status = %status, "Finished");
                Ok(CommandOutput {
                    exit_code: status.code(),
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                })
            }
            None => {
                warn!(command = %spec, "Interrupted, killing benchmark");
                // Kills and then reaps the child. It may already be gone.
                if let Err(e) = child.kill().await {
                    debug!(command = %spec, error = %e, "Benchmark had already exited");
                }
                Err(RunnerError::Interrupted {
                    command: spec.to_string(),
                })
            }
        }
    }
}

/// Drain both output pipes while waiting for the child, so a chatty child
/// never blocks on a full pipe.
async fn wait_with_output(
    child: &mut Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
) -> io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    let mut err = Vec::new();

    let (status, _, _) = tokio::try_join!(
        child.wait(),
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err)
    )?;

    Ok((status, out, err))
}
