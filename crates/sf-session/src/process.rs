//! Solver session backed by a bridge process speaking the line protocol.

use crate::error::{SessionError, SessionResult};
use crate::protocol::{self, Request};
use crate::session::SolverSession;
use crate::value::{FieldValue, ModelOptions, SettingValue};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long `close` waits for the bridge to exit before killing it.
const EXIT_GRACE: Duration = Duration::from_secs(5);
const EXIT_POLL: Duration = Duration::from_millis(20);

/// How to start the solver bridge process.
#[derive(Debug, Clone)]
pub struct SolverLaunch {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Reply deadline for every request except `iterate`.
    pub command_timeout: Duration,
    /// Reply deadline for `iterate`; falls back to `command_timeout`.
    pub iterate_timeout: Option<Duration>,
}

impl SolverLaunch {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            command_timeout: Duration::from_secs(300),
            iterate_timeout: None,
        }
    }
}

/// A live solver bridge process.
///
/// Replies are read on a background thread so every request can be bounded by
/// a deadline. A reply that arrives after its request timed out is discarded.
pub struct ProcessSession {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    replies: Receiver<io::Result<String>>,
    stale_replies: usize,
    command_timeout: Duration,
    iterate_timeout: Duration,
}

impl ProcessSession {
    /// Spawn the bridge process described by `launch`.
    pub fn launch(launch: &SolverLaunch) -> SessionResult<Self> {
        let mut command = Command::new(&launch.command);
        command
            .args(&launch.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &launch.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn()?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| SessionError::Protocol {
            message: "solver stdout was not captured".to_string(),
        })?;

        let (tx, replies) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        info!(
            command = %launch.command,
            pid = child.id(),
            "Solver session opened"
        );

        Ok(Self {
            child: Some(child),
            stdin,
            replies,
            stale_replies: 0,
            command_timeout: launch.command_timeout,
            iterate_timeout: launch.iterate_timeout.unwrap_or(launch.command_timeout),
        })
    }

    fn send(&mut self, request: &Request<'_>, timeout: Duration) -> SessionResult<String> {
        let line = request.encode()?;
        let stdin = self.stdin.as_mut().ok_or(SessionError::Closed)?;
        debug!(request = %line, "-> solver");
        writeln!(stdin, "{}", line)?;
        stdin.flush()?;

        // A deadline past what `Instant` can represent means wait indefinitely.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let reply = match deadline {
                Some(deadline) => self
                    .replies
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .replies
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match reply {
                Ok(Ok(reply)) => {
                    if self.stale_replies > 0 {
                        self.stale_replies -= 1;
                        debug!(reply = %reply, "Discarding late solver reply");
                        continue;
                    }
                    debug!(reply = %reply, "<- solver");
                    return Ok(reply);
                }
                Ok(Err(e)) => return Err(SessionError::Io(e)),
                Err(RecvTimeoutError::Timeout) => {
                    self.stale_replies += 1;
                    return Err(SessionError::Timeout {
                        message: format!(
                            "no reply to '{}' within {:.1}s",
                            line,
                            timeout.as_secs_f64()
                        ),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => return Err(SessionError::Closed),
            }
        }
    }

    fn send_expect_ok(&mut self, request: &Request<'_>) -> SessionResult<()> {
        let reply = self.send(request, self.command_timeout)?;
        protocol::expect_empty(&protocol::parse_reply(&reply)?)
    }

    fn shutdown(&mut self) -> SessionResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if let Some(mut stdin) = self.stdin.take() {
            // The bridge may already be gone; closing stdin is enough either way.
            let _ = writeln!(stdin, "{}", Request::Exit.encode()?);
            let _ = stdin.flush();
        }

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                info!(%status, "Solver session closed");
                return Ok(());
            }
            if started.elapsed() >= EXIT_GRACE {
                warn!("Solver did not exit after {:?}; killing it", EXIT_GRACE);
                child.kill()?;
                child.wait()?;
                return Ok(());
            }
            thread::sleep(EXIT_POLL);
        }
    }
}

impl SolverSession for ProcessSession {
    fn read_case(&mut self, path: &Path) -> SessionResult<()> {
        self.send_expect_ok(&Request::ReadCase { path })
    }

    fn set_model(&mut self, name: &str, options: &ModelOptions) -> SessionResult<()> {
        self.send_expect_ok(&Request::SetModel { name, options })
    }

    fn set_boundary_parameter(
        &mut self,
        surface: &str,
        key: &str,
        value: &SettingValue,
    ) -> SessionResult<()> {
        self.send_expect_ok(&Request::SetBoundary {
            surface,
            key,
            value,
        })
    }

    fn initialize(&mut self) -> SessionResult<()> {
        self.send_expect_ok(&Request::Initialize)
    }

    fn run_iterations(&mut self, iterations: u32) -> SessionResult<()> {
        let reply = self.send(&Request::Iterate { iterations }, self.iterate_timeout)?;
        protocol::expect_empty(&protocol::parse_reply(&reply)?)
    }

    fn get_field_quantity(&mut self, surface: &str, field: &str) -> SessionResult<FieldValue> {
        let reply = self.send(&Request::Field { surface, field }, self.command_timeout)?;
        protocol::parse_field(&protocol::parse_reply(&reply)?)
    }

    fn close(&mut self) -> SessionResult<()> {
        self.shutdown()
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        self.stdin.take();
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                warn!(pid = child.id(), "Solver session dropped while open; killing solver");
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}
