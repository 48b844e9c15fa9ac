//! Command execution over SSH
//!
//! Provides the `CommandOutput` struct and the exec-channel collector used
//! by [`SshSession`](super::session::SshSession).

use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg};
use tracing::debug;

use super::handler::SshHandler;
use crate::error::{KeySetupError, Result};

/// Output from a command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,

    /// Standard error from the command
    pub stderr: String,

    /// Exit code of the command (if available)
    pub exit_code: Option<u32>,

    /// Signal that terminated the command, if the server reported one
    pub exit_signal: Option<String>,
}

impl CommandOutput {
    /// Create a new empty CommandOutput
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the command succeeded: exit code 0 and no terminating signal
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && self.exit_signal.is_none()
    }
}

/// Run `command` on a fresh exec channel and wait for it to finish
pub(crate) async fn exec_on_handle(
    handle: &Handle<SshHandler>,
    command: &str,
) -> Result<CommandOutput> {
    let channel = handle
        .channel_open_session()
        .await
        .map_err(|e| KeySetupError::channel(format!("Failed to open channel: {}", e)))?;

    channel
        .exec(true, command)
        .await
        .map_err(|e| KeySetupError::channel(format!("Failed to exec command: {}", e)))?;

    Ok(collect_channel_output(channel).await)
}

/// Collect output from a channel until it closes
///
/// The exit status may arrive after EOF, so only `Close` ends collection.
async fn collect_channel_output(mut channel: Channel<Msg>) -> CommandOutput {
    let mut output = CommandOutput::new();

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                output.stdout.push_str(&String::from_utf8_lossy(&data));
            }
            ChannelMsg::ExtendedData { data, ext } => {
                // ext == 1 is SSH_EXTENDED_DATA_STDERR
                if ext == 1 {
                    output.stderr.push_str(&String::from_utf8_lossy(&data));
                } else {
                    output.stdout.push_str(&String::from_utf8_lossy(&data));
                }
            }
            ChannelMsg::ExitStatus { exit_status } => {
                output.exit_code = Some(exit_status);
            }
            ChannelMsg::ExitSignal {
                signal_name,
                error_message,
                ..
            } => {
                debug!("Command terminated by signal {:?}: {}", signal_name, error_message);
                output.exit_signal = Some(format!("{:?}", signal_name));
            }
            ChannelMsg::Close => break,
            _ => {}
        }
    }

    debug!(
        "Command completed: exit_code={:?}, exit_signal={:?}, stdout_len={}, stderr_len={}",
        output.exit_code,
        output.exit_signal,
        output.stdout.len(),
        output.stderr.len()
    );

    output
}
