//! Remote command runner
//!
//! Opens one authenticated session, executes an ordered list of
//! [`CommandStep`]s on it and stops at the first failure. The session is
//! closed exactly once on every path after a successful connect.

use tracing::{error, info};

use crate::error::{ErrorKind, KeySetupError};
use crate::ssh::{
    sanitize_command, CommandOutput, ConnectionTarget, Credentials, RemoteSession,
    SessionConnector,
};

/// One remote command plus a human-readable description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    pub command: String,
    pub description: String,
}

impl CommandStep {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Result of a single step, reported and then dropped
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_status: Option<u32>,
    pub exit_signal: Option<String>,
}

impl StepOutcome {
    /// Short description of how a failed step ended
    fn termination(&self) -> String {
        match (&self.exit_signal, self.exit_status) {
            (Some(signal), _) => format!("signal {}", signal),
            (None, Some(code)) => format!("exit status {}", code),
            (None, None) => "no exit status".to_string(),
        }
    }
}

impl From<CommandOutput> for StepOutcome {
    fn from(output: CommandOutput) -> Self {
        Self {
            succeeded: output.success(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_status: output.exit_code,
            exit_signal: output.exit_signal,
        }
    }
}

/// Why a run stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&KeySetupError> for RunFailure {
    fn from(err: &KeySetupError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Overall result of [`Runner::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Steps that completed successfully, in order
    pub completed_steps: usize,
    pub failure: Option<RunFailure>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Executes step lists over sessions opened by `C`
#[derive(Debug, Clone)]
pub struct Runner<C> {
    connector: C,
}

impl<C: SessionConnector> Runner<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Connect, run `steps` in order and disconnect
    pub async fn run(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
        steps: &[CommandStep],
    ) -> RunOutcome {
        info!("Launching SSH connection to {}:{}...", target.host(), target.port());

        let mut session = match self.connector.connect(target, credentials).await {
            Ok(session) => session,
            Err(e) => {
                error!("✗ SSH connection failed: {}", e);
                return RunOutcome {
                    completed_steps: 0,
                    failure: Some(RunFailure::from(&e)),
                };
            }
        };

        info!("✓ Successfully connected to SSH server!");

        let outcome = run_steps(&mut session, steps).await;
        session.close().await;
        outcome
    }
}

async fn run_steps<S: RemoteSession>(session: &mut S, steps: &[CommandStep]) -> RunOutcome {
    for (index, step) in steps.iter().enumerate() {
        let failure = match run_step(session, step).await {
            Ok(outcome) if outcome.succeeded => {
                report_success(step, &outcome);
                continue;
            }
            Ok(outcome) => {
                report_failure(step, &outcome);
                RunFailure {
                    kind: ErrorKind::Unknown,
                    message: format!(
                        "{} failed with {}",
                        step.description,
                        outcome.termination()
                    ),
                }
            }
            Err(e) => {
                error!("✗ {} failed: {}", step.description, e);
                RunFailure::from(&e)
            }
        };

        return RunOutcome {
            completed_steps: index,
            failure: Some(failure),
        };
    }

    RunOutcome {
        completed_steps: steps.len(),
        failure: None,
    }
}

async fn run_step<S: RemoteSession>(
    session: &mut S,
    step: &CommandStep,
) -> crate::error::Result<StepOutcome> {
    let command = sanitize_command(&step.command)?;
    let output = session.exec(&command).await?;
    Ok(StepOutcome::from(output))
}

fn report_success(step: &CommandStep, outcome: &StepOutcome) {
    let stdout = outcome.stdout.trim();
    if stdout.is_empty() {
        info!("✓ {}", step.description);
    } else {
        info!("✓ {}: {}", step.description, stdout);
    }
}

fn report_failure(step: &CommandStep, outcome: &StepOutcome) {
    error!("✗ {} failed ({})", step.description, outcome.termination());
    let stderr = outcome.stderr.trim();
    if !stderr.is_empty() {
        error!("Error: {}", stderr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::error::Result;

    /// Records executed commands and close calls
    #[derive(Default)]
    struct Journal {
        executed: Vec<String>,
        closes: usize,
    }

    #[derive(Clone, Copy)]
    enum Reply {
        Exit(u32),
        /// Channel closed without an exit-status
        NoStatus,
        Signal(&'static str),
        TransportError,
    }

    struct MockSession {
        journal: Arc<Mutex<Journal>>,
        replies: HashMap<String, Reply>,
    }

    #[async_trait]
    impl RemoteSession for MockSession {
        async fn exec(&mut self, command: &str) -> Result<CommandOutput> {
            self.journal
                .lock()
                .unwrap()
                .executed
                .push(command.to_string());

            match self.replies.get(command).copied().unwrap_or(Reply::Exit(0)) {
                Reply::Exit(code) => Ok(CommandOutput {
                    stdout: format!("{}-out\n", command),
                    stderr: if code == 0 { String::new() } else { "boom".into() },
                    exit_code: Some(code),
                    exit_signal: None,
                }),
                Reply::NoStatus => Ok(CommandOutput {
                    stdout: format!("{}-out\n", command),
                    ..CommandOutput::default()
                }),
                Reply::Signal(signal) => Ok(CommandOutput {
                    exit_signal: Some(signal.to_string()),
                    ..CommandOutput::default()
                }),
                Reply::TransportError => Err(KeySetupError::channel("channel closed")),
            }
        }

        async fn close(&mut self) {
            self.journal.lock().unwrap().closes += 1;
        }
    }

    #[derive(Clone)]
    struct MockConnector {
        journal: Arc<Mutex<Journal>>,
        replies: HashMap<String, Reply>,
        connect_error: Option<fn() -> KeySetupError>,
    }

    impl MockConnector {
        fn new(replies: &[(&str, Reply)]) -> Self {
            Self {
                journal: Arc::default(),
                replies: replies
                    .iter()
                    .map(|(cmd, reply)| (cmd.to_string(), *reply))
                    .collect(),
                connect_error: None,
            }
        }

        fn failing(error: fn() -> KeySetupError) -> Self {
            Self {
                connect_error: Some(error),
                ..Self::new(&[])
            }
        }

        fn executed(&self) -> Vec<String> {
            self.journal.lock().unwrap().executed.clone()
        }

        fn closes(&self) -> usize {
            self.journal.lock().unwrap().closes
        }
    }

    #[async_trait]
    impl SessionConnector for MockConnector {
        type Session = MockSession;

        async fn connect(
            &self,
            _target: &ConnectionTarget,
            _credentials: &Credentials,
        ) -> Result<MockSession> {
            if let Some(error) = self.connect_error {
                return Err(error());
            }
            Ok(MockSession {
                journal: self.journal.clone(),
                replies: self.replies.clone(),
            })
        }
    }

    fn target() -> ConnectionTarget {
        ConnectionTarget::new("127.0.0.1", 2222, "admin")
    }

    fn steps() -> Vec<CommandStep> {
        vec![
            CommandStep::new("a", "Step A"),
            CommandStep::new("b", "Step B"),
            CommandStep::new("c", "Step C"),
        ]
    }

    #[tokio::test]
    async fn test_all_steps_succeed_in_order() {
        let connector = MockConnector::new(&[]);
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &steps())
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.completed_steps, 3);
        assert_eq!(connector.executed(), vec!["a", "b", "c"]);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_stops_at_first_failing_step() {
        let connector = MockConnector::new(&[("b", Reply::Exit(1))]);
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &steps())
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.completed_steps, 1);
        assert_eq!(connector.executed(), vec!["a", "b"]);
        assert_eq!(connector.closes(), 1);

        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::Unknown);
        assert!(failure.message.contains("Step B"));
        assert!(failure.message.contains("exit status 1"));
    }

    #[tokio::test]
    async fn test_missing_exit_status_stops_run() {
        let connector = MockConnector::new(&[("b", Reply::NoStatus)]);
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &steps())
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.completed_steps, 1);
        assert_eq!(connector.executed(), vec!["a", "b"]);
        assert_eq!(connector.closes(), 1);
        assert!(outcome
            .failure
            .unwrap()
            .message
            .contains("no exit status"));
    }

    #[tokio::test]
    async fn test_signalled_step_stops_run() {
        let connector = MockConnector::new(&[("b", Reply::Signal("KILL"))]);
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &steps())
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.completed_steps, 1);
        assert_eq!(connector.executed(), vec!["a", "b"]);
        assert_eq!(connector.closes(), 1);

        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::Unknown);
        assert!(failure.message.contains("signal KILL"));
    }

    #[tokio::test]
    async fn test_transport_error_stops_and_closes() {
        let connector = MockConnector::new(&[("a", Reply::TransportError)]);
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &steps())
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.completed_steps, 0);
        assert_eq!(connector.executed(), vec!["a"]);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_empty_command_fails_without_exec() {
        let connector = MockConnector::new(&[]);
        let steps = vec![
            CommandStep::new("a", "Step A"),
            CommandStep::new("   ", "Blank"),
            CommandStep::new("c", "Step C"),
        ];
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &steps)
            .await;

        assert!(!outcome.is_success());
        assert_eq!(connector.executed(), vec!["a"]);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_is_classified() {
        let connector = MockConnector::failing(|| KeySetupError::auth("rejected"));
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("wrong"), &steps())
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.completed_steps, 0);
        assert_eq!(
            outcome.failure.unwrap().kind,
            ErrorKind::AuthenticationFailed
        );
        assert!(connector.executed().is_empty());
        // Nothing was opened, so nothing to close
        assert_eq!(connector.closes(), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_is_classified() {
        let connector = MockConnector::failing(|| KeySetupError::connection("refused"));
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &steps())
            .await;

        assert_eq!(outcome.failure.unwrap().kind, ErrorKind::ConnectionFailed);
    }

    #[tokio::test]
    async fn test_empty_step_list_succeeds() {
        let connector = MockConnector::new(&[]);
        let outcome = Runner::new(connector.clone())
            .run(&target(), &Credentials::password("pw"), &[])
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.completed_steps, 0);
        assert_eq!(connector.closes(), 1);
    }

    #[test]
    fn test_step_outcome_from_output() {
        let outcome = StepOutcome::from(CommandOutput {
            stdout: "/home/admin\n".into(),
            stderr: String::new(),
            exit_code: Some(0),
            exit_signal: None,
        });
        assert!(outcome.succeeded);
        assert_eq!(outcome.exit_status, Some(0));
    }
}
