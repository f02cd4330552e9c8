//! Classification of `mosquitto_ctrl` error output
//!
//! `mosquitto_ctrl` reports broker-side failures by printing a single line of
//! the form `Connection error: <reason>` to stderr. The possible reasons come
//! from libmosquitto's `mosquitto_connack_string`, for example:
//!
//! ```text
//! Connection error: Not authorized
//! ```

use thiserror::Error;

/// Prefix printed by `mosquitto_ctrl` when the broker refuses the action.
///
/// Changing this string is a compatibility break with the control binary.
pub const CONNECTION_ERROR_MARKER: &str = "Connection error: ";

/// Broker-side rejection reported by `mosquitto_ctrl` on stderr
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Connection error: {reason}")]
pub struct ConnectionError {
    /// Text following the marker, up to the end of that line
    pub reason: String,
}

impl ConnectionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Scan captured stderr for the first connection error.
///
/// Returns `None` when the marker does not occur. Anything else written to
/// stderr (warnings, usage hints) is not considered a failure here.
///
/// # Examples
/// ```
/// use dynsec_mcp::dynsec::classify;
///
/// let err = classify("Connection error: Not authorized\n").unwrap();
/// assert_eq!(err.reason, "Not authorized");
/// assert!(classify("all good").is_none());
/// ```
pub fn classify(stderr: &str) -> Option<ConnectionError> {
    let start = stderr.find(CONNECTION_ERROR_MARKER)? + CONNECTION_ERROR_MARKER.len();
    let rest = &stderr[start..];
    let line = match rest.find('\n') {
        Some(end) => &rest[..end],
        None => rest,
    };

    Some(ConnectionError::new(line.strip_suffix('\r').unwrap_or(line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty() {
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_classify_unrelated_stderr() {
        assert_eq!(classify("Warning: something odd\nError: Role not found\n"), None);
        // Marker without the trailing space is not a match
        assert_eq!(classify("Connection error:Not authorized"), None);
    }

    #[test]
    fn test_classify_reason_until_newline() {
        let err = classify("Connection error: Not authorized\nmore text").unwrap();
        assert_eq!(err.reason, "Not authorized");
    }

    #[test]
    fn test_classify_reason_until_end_of_stream() {
        let err = classify("Connection error: Not authorized").unwrap();
        assert_eq!(err.reason, "Not authorized");
    }

    #[test]
    fn test_classify_first_occurrence_only() {
        let stderr = "Connection error: Not authorized\nConnection error: Server unavailable\n";
        let err = classify(stderr).unwrap();
        assert_eq!(err.reason, "Not authorized");
    }

    #[test]
    fn test_classify_marker_mid_line() {
        let err = classify("prefix Connection error: Server unavailable\n").unwrap();
        assert_eq!(err.reason, "Server unavailable");
    }

    #[test]
    fn test_classify_strips_carriage_return() {
        let err = classify("Connection error: Not authorized\r\n").unwrap();
        assert_eq!(err.reason, "Not authorized");
    }

    #[test]
    fn test_classify_empty_reason() {
        let err = classify("Connection error: \n").unwrap();
        assert_eq!(err.reason, "");
    }

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::new("Not authorized");
        assert_eq!(err.to_string(), "Connection error: Not authorized");
    }
}
