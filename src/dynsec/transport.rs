//! Remote execution seam
//!
//! The dynsec operations only need a way to run one command with a given
//! stdin and get its output back. [`CommandTransport`] is that capability;
//! the SSH implementation lives in [`crate::ssh`].

use async_trait::async_trait;

use crate::error::Result;

/// Output from a command execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,

    /// Standard error from the command
    pub stderr: String,

    /// Exit code of the command (if available)
    pub exit_code: Option<u32>,
}

impl CommandOutput {
    /// Create a new empty CommandOutput
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the command succeeded (exit code 0 or no exit code available)
    pub fn success(&self) -> bool {
        self.exit_code.is_none_or(|code| code == 0)
    }
}

/// Runs a single command remotely with the given bytes as its stdin.
///
/// Each call is independent. Implementations must return an error only when
/// the command could not be run at all; a command that ran and failed is
/// reported through [`CommandOutput`].
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn run(&self, command: &str, stdin: &[u8]) -> Result<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_success() {
        let output = CommandOutput {
            stdout: "hello".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        };
        assert!(output.success());
    }

    #[test]
    fn test_command_output_failure() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: "error".to_string(),
            exit_code: Some(1),
        };
        assert!(!output.success());
    }

    #[test]
    fn test_command_output_no_exit_code() {
        let output = CommandOutput {
            stdout: "hello".to_string(),
            ..CommandOutput::new()
        };
        assert!(output.success());
    }
}
