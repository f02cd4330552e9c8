//! Shared execution routine for `mosquitto_ctrl` invocations

use tracing::{debug, warn};

use super::classify::classify;
use super::logger::CommandLogger;
use super::transport::{CommandOutput, CommandTransport};
use crate::error::{DynsecError, Result};

/// Build the stdin fed to `mosquitto_ctrl`.
///
/// Every line is newline-terminated and the administrator password is always
/// the last line, since the tool prompts for it after any other input.
pub fn build_stdin(secret_lines: &[&str], admin_password: &str) -> String {
    let mut stdin = String::new();
    for line in secret_lines.iter().chain(std::iter::once(&admin_password)) {
        stdin.push_str(line);
        stdin.push('\n');
    }
    stdin
}

/// Run one command through the transport and classify its outcome.
///
/// Transport failures are returned untouched. Otherwise stderr is checked
/// for a broker connection error first, then the exit status.
pub async fn execute<T>(
    transport: &T,
    command: &str,
    secret_lines: &[&str],
    admin_password: &str,
    logger: Option<&dyn CommandLogger>,
) -> Result<()>
where
    T: CommandTransport + ?Sized,
{
    let stdin = build_stdin(secret_lines, admin_password);
    debug!(
        "Running '{}' with {} stdin line(s)",
        command,
        secret_lines.len() + 1
    );

    let output = match transport.run(command, stdin.as_bytes()).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(logger) = logger {
                logger.cmd(command, &stdin, &CommandOutput::new());
            }
            return Err(e);
        }
    };

    if let Some(logger) = logger {
        logger.cmd(command, &stdin, &output);
    }

    if let Some(err) = classify(&output.stderr) {
        warn!("Broker rejected '{}': {}", command, err.reason);
        return Err(err.into());
    }

    match output.exit_code {
        Some(code) if code != 0 => Err(DynsecError::CommandFailed {
            exit_code: code,
            stderr: output.stderr,
        }),
        _ => Ok(()),
    }
}
