//! Streaming command execution
//!
//! Commands are spawned through `duct` with stdout and stderr each
//! redirected into an `os_pipe`. Two reader threads drain the pipes
//! line-by-line as output arrives; every line is logged and appended to
//! that stream's capture buffer, exactly once, in arrival order per
//! stream. The calling thread blocks until the process exits and both
//! pipes are fully drained, polling the cancellation token in between.

use crate::error::{Error, Result};
use std::io::{BufRead, BufReader};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use strato_core::{CancelToken, ExecutionEnvironment};

/// How often the wait loop checks the cancellation token
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Options for one command invocation
#[derive(Debug, Clone, Copy)]
pub struct ExecOptions<'a> {
    /// Working directory and environment variables for the child
    pub env: &'a ExecutionEnvironment,
    /// Cancellation token polled while the child runs
    pub cancel: &'a CancelToken,
}

/// Outcome of a completed (not cancelled) command
#[derive(Debug, Clone)]
pub struct Execution {
    /// Exit code; -1 if the process was terminated by a signal
    pub code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl Execution {
    /// Whether the process exited with code zero
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Convert a nonzero exit into [`Error::ExitStatus`]
    pub fn check(self, program: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::ExitStatus {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Execute a command, streaming and capturing its output
///
/// Returns `Ok` even for nonzero exits; use [`Execution::check`] when a
/// nonzero exit should be an error as-is. Cancellation kills the child
/// and returns [`Error::Cancelled`].
pub fn execute(options: &ExecOptions<'_>, program: &str, args: &[String]) -> Result<Execution> {
    let (out_reader, out_writer) = os_pipe::pipe()?;
    let (err_reader, err_writer) = os_pipe::pipe()?;

    let mut expr = duct::cmd(program, args)
        .dir(options.env.working_dir())
        .stdout_file(out_writer)
        .stderr_file(err_writer)
        .unchecked();
    if options.env.is_isolated() {
        // Isolated mode: the map is the whole child environment.
        expr = expr.full_env(options.env.vars().clone());
    } else {
        for (key, value) in options.env.vars() {
            expr = expr.env(key, value);
        }
    }

    tracing::debug!(
        program,
        args = ?args,
        dir = %options.env.working_dir().display(),
        "Executing command"
    );

    let handle = expr.start().map_err(|e| Error::Spawn {
        program: program.to_string(),
        source: e,
    })?;
    // The expression still owns this process's copies of the pipe
    // writers; drop it so the reader threads see EOF when the child
    // exits.
    drop(expr);

    let (tx, rx) = mpsc::channel();
    let readers = [
        spawn_reader(Stream::Stdout, out_reader, tx.clone()),
        spawn_reader(Stream::Stderr, err_reader, tx),
    ];

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut killed = false;

    loop {
        if !killed && options.cancel.is_cancelled() {
            tracing::warn!(program, "Cancellation requested, killing process");
            handle.kill()?;
            killed = true;
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok((Stream::Stdout, line)) => {
                tracing::debug!("{line}");
                stdout.push_str(&line);
                stdout.push('\n');
            }
            Ok((Stream::Stderr, line)) => {
                tracing::warn!("{line}");
                stderr.push_str(&line);
                stderr.push('\n');
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    for reader in readers {
        let _ = reader.join();
    }

    let output = handle.wait()?;

    if killed {
        return Err(Error::Cancelled {
            program: program.to_string(),
        });
    }

    let code = output.status.code().unwrap_or(-1);
    tracing::debug!(program, code, "Command finished");

    Ok(Execution {
        code,
        stdout,
        stderr,
    })
}

fn spawn_reader(
    stream: Stream,
    pipe: os_pipe::PipeReader,
    tx: mpsc::Sender<(Stream, String)>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.send((stream, line)).is_err() {
                break;
            }
        }
    })
}
