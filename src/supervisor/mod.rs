//! Lifecycle of the tor child process
//!
//! The supervisor owns the spawned child: it is the only place that starts
//! it, signals it, and reaps it. A dedicated drain task forwards everything
//! the child prints into the session log; it observes but never mutates
//! supervisor state. Liveness is answered from `try_wait`, so a child that
//! died behind our back shows up without any extra bookkeeping.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::constants;
use crate::logsink::LogSink;

/// Declared lifecycle of the supervised child.
///
/// Only `start` and `stop` rewrite the declared state; `Crashed` is derived
/// when a child declared `Running` turns out to have exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Idle,
    Starting,
    Running,
    Stopping,
    Crashed,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Idle => "idle",
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::Stopping => "stopping",
            ProcessState::Crashed => "crashed",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a start attempt did not produce a running child
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("tor is already running")]
    AlreadyRunning,
    #[error("tor binary `{path}` not found; install it (brew install tor) or set tor_path")]
    ExecutableNotFound { path: String },
    #[error("failed to launch tor: {0}")]
    Spawn(#[source] io::Error),
}

struct Inner {
    child: Option<Child>,
    state: ProcessState,
    torrc: Option<PathBuf>,
    drain: Option<JoinHandle<()>>,
}

impl Inner {
    /// Non-blocking liveness straight from the OS
    fn child_alive(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Drop the remains of a child that already exited: the reaped handle,
    /// the detached drain task, and the stale temp torrc
    fn discard_finished(&mut self) {
        self.child = None;
        self.drain = None;
        if let Some(path) = self.torrc.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Owns the tor child process and its teardown policy
pub struct TorSupervisor {
    inner: Mutex<Inner>,
    sink: Arc<LogSink>,
    grace: Duration,
}

impl TorSupervisor {
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self::with_grace(sink, constants::STOP_GRACE)
    }

    /// Supervisor with a custom SIGTERM grace window (tests shorten it)
    pub fn with_grace(sink: Arc<LogSink>, grace: Duration) -> Self {
        TorSupervisor {
            inner: Mutex::new(Inner {
                child: None,
                state: ProcessState::Idle,
                torrc: None,
                drain: None,
            }),
            sink,
            grace,
        }
    }

    /// Spawn tor with the given torrc. Refused while a live child exists;
    /// the remains of a crashed one are discarded first.
    pub async fn start(&self, tor_path: &str, torrc: &Path) -> Result<(), LaunchError> {
        let mut inner = self.inner.lock().await;
        if inner.child_alive() {
            return Err(LaunchError::AlreadyRunning);
        }
        inner.discard_finished();

        inner.state = ProcessState::Starting;
        tracing::debug!(%tor_path, torrc = %torrc.display(), "spawning tor");
        let mut child = match Command::new(tor_path)
            .arg("-f")
            .arg(torrc)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                inner.state = ProcessState::Idle;
                return Err(if err.kind() == io::ErrorKind::NotFound {
                    LaunchError::ExecutableNotFound {
                        path: tor_path.to_string(),
                    }
                } else {
                    LaunchError::Spawn(err)
                });
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        inner.drain = Some(tokio::spawn(drain_output(
            stdout.map(|s| BufReader::new(s).lines()),
            stderr.map(|s| BufReader::new(s).lines()),
            Arc::clone(&self.sink),
        )));
        inner.child = Some(child);
        inner.torrc = Some(torrc.to_path_buf());
        inner.state = ProcessState::Running;
        Ok(())
    }

    /// Tear the child down: SIGTERM, a bounded grace, then SIGKILL. Removes
    /// the temp torrc and lands in `Idle`, unless a new child was started
    /// while the teardown ran unlocked; that start keeps its own state.
    /// Calling this with nothing running, or after a crash, is a quiet
    /// no-op; only a live child gets signalled and logged.
    pub async fn stop(&self) {
        let (mut child, drain, torrc) = {
            let mut inner = self.inner.lock().await;
            let Some(child) = inner.child.take() else {
                inner.state = ProcessState::Idle;
                return;
            };
            inner.state = ProcessState::Stopping;
            (child, inner.drain.take(), inner.torrc.take())
        };

        // The termination dance runs unlocked so liveness reads and the
        // health tick never stall behind the grace window
        if matches!(child.try_wait(), Ok(None)) {
            self.log("Disconnecting Tor...");
            terminate(&mut child, self.grace).await;
        }

        if let Some(handle) = drain {
            // Bounded: a transport child that inherited the pipes can hold
            // them open past tor's exit
            let _ = timeout(constants::DRAIN_SETTLE, handle).await;
        }
        if let Some(path) = torrc {
            let _ = std::fs::remove_file(path);
        }

        // A start() may have slipped in while we ran unlocked; only reclaim
        // the state when no new child took over
        let mut inner = self.inner.lock().await;
        if inner.child.is_none() {
            inner.state = ProcessState::Idle;
        }
    }

    /// Current lifecycle state, with `Crashed` derived for a child that
    /// exited while declared `Running`
    pub async fn state(&self) -> ProcessState {
        let mut inner = self.inner.lock().await;
        if inner.state == ProcessState::Running && !inner.child_alive() {
            return ProcessState::Crashed;
        }
        inner.state
    }

    /// Is the child alive right now? Answered via `try_wait`, no I/O
    pub async fn is_alive(&self) -> bool {
        self.inner.lock().await.child_alive()
    }

    /// Temp torrc the current child was launched with, if any
    pub async fn torrc_path(&self) -> Option<PathBuf> {
        self.inner.lock().await.torrc.clone()
    }

    fn log(&self, line: &str) {
        if let Err(err) = self.sink.append(line) {
            tracing::warn!(%err, "log append failed");
        }
    }
}

/// SIGTERM first, SIGKILL if the grace window runs out
async fn terminate(child: &mut Child, grace: Duration) {
    if let Some(pid) = child.id() {
        tracing::debug!(pid, "sending SIGTERM");
        if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            tracing::warn!(pid, %err, "SIGTERM failed");
        }
    }
    match timeout(grace, child.wait()).await {
        Ok(_) => {}
        Err(_) => {
            tracing::warn!(?grace, "tor ignored SIGTERM, sending SIGKILL");
            if child.start_kill().is_ok() {
                let _ = child.wait().await;
            }
        }
    }
}

/// Forward child output into the session log until both streams close, then
/// append the exit marker. Lines land in arrival order, whichever stream
/// they came from.
async fn drain_output<O, E>(
    mut stdout: Option<Lines<BufReader<O>>>,
    mut stderr: Option<Lines<BufReader<E>>>,
    sink: Arc<LogSink>,
) where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    loop {
        tokio::select! {
            line = next_line(&mut stdout), if stdout.is_some() => {
                match line {
                    Some(text) => append_quiet(&sink, &text),
                    None => stdout = None,
                }
            }
            line = next_line(&mut stderr), if stderr.is_some() => {
                match line {
                    Some(text) => append_quiet(&sink, &text),
                    None => stderr = None,
                }
            }
            else => break,
        }
    }
    append_quiet(&sink, constants::PROCESS_EXITED_MARKER);
}

/// Next line off an optional stream; `None` marks the stream as finished
/// (read errors count as end of stream)
async fn next_line<R>(lines: &mut Option<Lines<BufReader<R>>>) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let reader = lines.as_mut()?;
    match reader.next_line().await {
        Ok(next) => next,
        Err(err) => {
            tracing::debug!(%err, "output stream read error");
            None
        }
    }
}

fn append_quiet(sink: &LogSink, line: &str) {
    if let Err(err) = sink.append(line) {
        tracing::warn!(%err, "log append failed");
    }
}
