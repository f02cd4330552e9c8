//! Command execution over SSH
//!
//! Implements [`CommandTransport`] for [`SshConnectionManager`]: one exec
//! channel per command, stdin written up front, stdout/stderr collected
//! until the channel closes.

use async_trait::async_trait;
use russh::ChannelMsg;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::connection::SshConnectionManager;
use crate::dynsec::{CommandOutput, CommandTransport};
use crate::error::{DynsecError, Result};

/// stderr is delivered as extended data of this type
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

impl SshConnectionManager {
    /// Execute a command over a fresh exec channel
    ///
    /// This method:
    /// 1. Ensures the connection is active
    /// 2. Opens a new exec channel and starts the command
    /// 3. Writes `stdin` and signals EOF
    /// 4. Collects stdout/stderr, bounded by the configured command timeout
    pub async fn exec_with_stdin(&self, command: &str, stdin: &[u8]) -> Result<CommandOutput> {
        self.ensure_connected().await?;

        let channel = self.open_channel().await?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| DynsecError::connection(format!("Failed to exec command: {}", e)))?;

        if !stdin.is_empty() {
            channel
                .data(stdin)
                .await
                .map_err(|e| DynsecError::connection(format!("Failed to write stdin: {}", e)))?;
        }
        channel
            .eof()
            .await
            .map_err(|e| DynsecError::connection(format!("Failed to close stdin: {}", e)))?;

        match self.config.command_timeout {
            Some(limit) => match timeout(limit, collect_channel_output(channel)).await {
                Ok(output) => output,
                Err(_) => {
                    warn!(
                        "Command timed out after {}ms: {}",
                        limit.as_millis(),
                        command
                    );
                    Err(DynsecError::Timeout(limit.as_millis() as u64))
                }
            },
            None => collect_channel_output(channel).await,
        }
    }
}

/// Collect output from a channel until it closes
async fn collect_channel_output(
    mut channel: russh::Channel<russh::client::Msg>,
) -> Result<CommandOutput> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut exit_code = None;

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                stdout.extend_from_slice(&data);
            }
            ChannelMsg::ExtendedData { data, ext } => {
                if ext == SSH_EXTENDED_DATA_STDERR {
                    stderr.extend_from_slice(&data);
                } else {
                    stdout.extend_from_slice(&data);
                }
            }
            ChannelMsg::ExitStatus { exit_status } => {
                exit_code = Some(exit_status);
            }
            ChannelMsg::Close => {
                break;
            }
            _ => {}
        }
    }

    let output = CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
    };

    debug!(
        "Command completed: exit_code={:?}, stdout_len={}, stderr_len={}",
        output.exit_code,
        output.stdout.len(),
        output.stderr.len()
    );

    Ok(output)
}

#[async_trait]
impl CommandTransport for SshConnectionManager {
    async fn run(&self, command: &str, stdin: &[u8]) -> Result<CommandOutput> {
        self.exec_with_stdin(command, stdin).await
    }
}
