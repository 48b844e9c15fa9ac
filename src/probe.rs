//! Key-based login probe
//!
//! Asks the system OpenSSH client whether it can log into the target
//! non-interactively. The child process is bounded by a wall-clock timeout
//! and killed if it overruns, so a probe always finishes.

use std::ffi::OsString;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{PROBE_CONNECT_TIMEOUT_SECS, PROBE_WAIT_TIMEOUT_SECS};
use crate::ssh::ConnectionTarget;

/// How a bounded child process ended
#[derive(Debug)]
pub enum BoundedExit {
    /// Exited on its own before the deadline
    Exited(ExitStatus),
    /// Deadline elapsed; the child was sent a kill request
    TimedOut,
    /// Spawning or waiting failed
    Failed(io::Error),
}

impl BoundedExit {
    /// True only for a clean exit with status 0
    pub fn success(&self) -> bool {
        matches!(self, BoundedExit::Exited(status) if status.success())
    }
}

/// Upper bound on waiting for a killed child to be reaped
pub const REAP_TIMEOUT: Duration = Duration::from_secs(1);

/// Spawn `command` and wait for it at most `limit`
///
/// On timeout the child gets a kill request. A failing kill is logged and
/// otherwise ignored. Reaping a killed child is itself bounded by
/// [`REAP_TIMEOUT`]; a child that cannot be reaped is left to `kill_on_drop`.
pub async fn run_bounded(mut command: Command, limit: Duration) -> BoundedExit {
    command.kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return BoundedExit::Failed(e),
    };

    match timeout(limit, child.wait()).await {
        Ok(Ok(status)) => BoundedExit::Exited(status),
        Ok(Err(e)) => BoundedExit::Failed(e),
        Err(_) => {
            debug!(
                "Child {:?} still running after {}ms, killing it",
                child.id(),
                limit.as_millis()
            );
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill timed-out child process: {}", e);
                return BoundedExit::TimedOut;
            }
            match timeout(REAP_TIMEOUT, child.wait()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Failed to reap timed-out child process: {}", e),
                Err(_) => warn!(
                    "Timed-out child process not reaped within {}ms",
                    REAP_TIMEOUT.as_millis()
                ),
            }
            BoundedExit::TimedOut
        }
    }
}

/// Checks whether key-based login to a target already works
#[derive(Debug, Clone)]
pub struct LoginProber {
    program: OsString,
    connect_timeout: Duration,
    wait_timeout: Duration,
}

impl LoginProber {
    /// Prober using `ssh` from `PATH` with the default timeouts
    pub fn new() -> Self {
        Self {
            program: OsString::from("ssh"),
            connect_timeout: Duration::from_secs(PROBE_CONNECT_TIMEOUT_SECS),
            wait_timeout: Duration::from_secs(PROBE_WAIT_TIMEOUT_SECS),
        }
    }

    /// Use a different client binary
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Value passed to the client as `-o ConnectTimeout`
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Deadline for the whole client process
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Arguments passed to the client for `target`
    pub fn args(&self, target: &ConnectionTarget) -> Vec<String> {
        vec![
            "-p".to_string(),
            target.port().to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            target.destination(),
            "whoami".to_string(),
        ]
    }

    /// Returns true only if a non-interactive login to `target` succeeded
    /// within the deadline. Every failure mode yields false.
    pub async fn probe(&self, target: &ConnectionTarget) -> bool {
        let mut command = Command::new(&self.program);
        command
            .args(self.args(target))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        debug!("Probing key-based login for {}", target);

        match run_bounded(command, self.wait_timeout).await {
            BoundedExit::Exited(status) => {
                debug!("Probe client exited with {}", status);
                status.success()
            }
            BoundedExit::TimedOut => {
                debug!(
                    "Probe timed out after {}ms",
                    self.wait_timeout.as_millis()
                );
                false
            }
            BoundedExit::Failed(e) => {
                debug!("Probe could not run {:?}: {}", self.program, e);
                false
            }
        }
    }
}

impl Default for LoginProber {
    fn default() -> Self {
        Self::new()
    }
}
