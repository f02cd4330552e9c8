//! Argument validation and quoting for remote shell command lines
//!
//! Command lines are run by the remote user's shell, so every argument is
//! rendered through [`shell_quote`] before being joined.

use crate::error::{DynsecError, Result};

/// Escape a string for use inside single quotes
///
/// # Example
/// ```
/// use dynsec_mcp::ssh::sanitize::escape_for_shell;
///
/// let escaped = escape_for_shell("it's");
/// assert_eq!(escaped, "it'\"'\"'s");
/// ```
pub fn escape_for_shell(s: &str) -> String {
    // 'word' becomes '"'"'word'"'"'
    s.replace('\'', "'\"'\"'")
}

fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '+' | '@' | '%' | '=' | ',')
}

/// Render one argument for a POSIX shell
///
/// Plain tokens are returned unchanged; anything else (including `#`, which
/// would start a comment) is wrapped in single quotes.
///
/// # Example
/// ```
/// use dynsec_mcp::ssh::sanitize::shell_quote;
///
/// assert_eq!(shell_quote("time_publisher"), "time_publisher");
/// assert_eq!(shell_quote("sensors/#"), "'sensors/#'");
/// ```
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(is_plain) {
        arg.to_string()
    } else {
        format!("'{}'", escape_for_shell(arg))
    }
}

/// Validate a dynsec name (role, client, ...) before it goes on a command line
///
/// Names must be non-empty and must not contain control characters, since a
/// newline would desynchronize the stdin lines `mosquitto_ctrl` reads.
pub fn validate_name(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DynsecError::invalid_params(format!(
            "{} cannot be empty",
            kind
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(DynsecError::invalid_params(format!(
            "{} must not contain control characters",
            kind
        )));
    }

    Ok(())
}

/// Validate a secret fed over stdin
///
/// Any single line is accepted, including an empty one; `mosquitto_ctrl`
/// decides what it allows.
pub fn validate_secret(kind: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r', '\0']) {
        return Err(DynsecError::invalid_params(format!(
            "{} must be a single line",
            kind
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_for_shell_no_quotes() {
        assert_eq!(escape_for_shell("ls -la"), "ls -la");
    }

    #[test]
    fn test_escape_for_shell_with_quotes() {
        assert_eq!(escape_for_shell("echo 'hello'"), "echo '\"'\"'hello'\"'\"'");
    }

    #[test]
    fn test_shell_quote_plain() {
        assert_eq!(shell_quote("time_current"), "time_current");
        assert_eq!(shell_quote("sensors/+/temp"), "sensors/+/temp");
        assert_eq!(
            shell_quote("/mosquitto/config/dynamic-security.json"),
            "/mosquitto/config/dynamic-security.json"
        );
    }

    #[test]
    fn test_shell_quote_special() {
        assert_eq!(shell_quote("#"), "'#'");
        assert_eq!(shell_quote("my role"), "'my role'");
        assert_eq!(shell_quote("$(reboot)"), "'$(reboot)'");
        assert_eq!(shell_quote("o'neil"), "'o'\"'\"'neil'");
    }

    #[test]
    fn test_shell_quote_empty() {
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Role name", "time").is_ok());
        assert!(validate_name("Role name", "my role").is_ok());

        let err = validate_name("Role name", "  ").unwrap_err();
        assert!(err.to_string().contains("Role name cannot be empty"));

        let err = validate_name("Client name", "a\nb").unwrap_err();
        assert!(err.to_string().contains("control characters"));
    }

    #[test]
    fn test_validate_secret() {
        assert!(validate_secret("Password", "123").is_ok());
        assert!(validate_secret("Password", " spaced ").is_ok());
        assert!(validate_secret("Password", "").is_ok());
        assert!(validate_secret("Password", "12\n3").is_err());
        assert!(validate_secret("Password", "123\r").is_err());
        assert!(validate_secret("Password", "1\02").is_err());
    }
}
