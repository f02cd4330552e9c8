//! Audit hook for executed commands

use tracing::info;

use super::transport::CommandOutput;

/// Receives every attempted command together with its captured streams.
///
/// Called after each attempt, whatever the outcome. Implementations are
/// side-effect only; they cannot change what the operation returns.
pub trait CommandLogger: Send + Sync {
    fn cmd(&self, command: &str, stdin: &str, output: &CommandOutput);
}

/// [`CommandLogger`] writing to `tracing` at INFO level.
///
/// Stdin carries passwords, so only its line count is recorded.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger;

impl CommandLogger for TracingLogger {
    fn cmd(&self, command: &str, stdin: &str, output: &CommandOutput) {
        info!(
            command = %command,
            stdin_lines = stdin.lines().count(),
            exit_code = ?output.exit_code,
            "executed command"
        );
        info!(stdout = %output.stdout.trim_end(), "stdout");
        info!(stderr = %output.stderr.trim_end(), "stderr");
    }
}

impl<F> CommandLogger for F
where
    F: Fn(&str, &str, &CommandOutput) + Send + Sync,
{
    fn cmd(&self, command: &str, stdin: &str, output: &CommandOutput) {
        self(command, stdin, output)
    }
}
