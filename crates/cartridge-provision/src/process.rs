//! External command invocation.
//!
//! Commands are described by a [`CommandSpec`] holding an argument vector, so
//! nothing is ever interpolated into a shell string. A [`CommandRunner`] runs
//! them; [`SystemRunner`] is the real implementation and tests substitute
//! their own.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A command to run: program, arguments, working directory, and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    /// Kill the process if it runs longer than this.
    pub timeout: Option<Duration>,
    pub expected_exit: i32,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
            expected_exit: 0,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn expect_exit(mut self, code: i32) -> Self {
        self.expected_exit = code;
        self
    }

    /// The program name as text.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// The arguments as text, for assertions and log output.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a command that exited with its expected code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs commands on behalf of the instantiation engine.
///
/// Implementations return [`Error::ProcessFailure`] when the exit code
/// differs from [`CommandSpec::expected_exit`] and [`Error::Timeout`] when the
/// process outlived its timeout and was killed.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!(command = %spec, cwd = ?spec.cwd, "Running command");
        let mut child = command.spawn().map_err(|source| Error::Spawn {
            command: spec.to_string(),
            source,
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match spec.timeout {
            None => child.wait().map_err(|source| Error::Spawn {
                command: spec.to_string(),
                source,
            })?,
            Some(limit) => match wait_until(&mut child, Instant::now() + limit, spec)? {
                Some(status) => status,
                None => {
                    kill(&mut child, spec);
                    return Err(Error::Timeout {
                        command: spec.to_string(),
                        limit,
                    });
                }
            },
        };

        let output = CommandOutput {
            exit_code: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        };

        if output.exit_code != Some(spec.expected_exit) {
            return Err(Error::ProcessFailure {
                command: spec.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Poll `child` until it exits or `deadline` passes. `None` means it is
/// still running.
fn wait_until(child: &mut Child, deadline: Instant, spec: &CommandSpec) -> Result<Option<ExitStatus>> {
    loop {
        let polled = child.try_wait().map_err(|source| Error::Spawn {
            command: spec.to_string(),
            source,
        })?;
        if let Some(status) = polled {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn kill(child: &mut Child, spec: &CommandSpec) {
    tracing::warn!(command = %spec, pid = child.id(), "Killing command after time limit");
    if let Err(e) = child.kill() {
        tracing::warn!(command = %spec, error = %e, "Failed to kill command");
    }
    // Reap so the child does not linger as a zombie.
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Locate `tool` on `PATH`.
pub fn find_on_path(tool: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let extensions: Vec<String> = if cfg!(windows) {
        std::env::var("PATHEXT")
            .unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string())
            .split(';')
            .map(|s| s.to_ascii_lowercase())
            .collect()
    } else {
        vec![String::new()]
    };

    std::env::split_paths(&path_var).find_map(|dir| {
        extensions.iter().find_map(|ext| {
            let candidate = dir.join(format!("{tool}{ext}"));
            candidate.is_file().then_some(candidate)
        })
    })
}
