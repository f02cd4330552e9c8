//! SSH client handler implementation
//!
//! Implements the `russh::client::Handler` trait to handle SSH connection events.

use russh::keys::HashAlg;
use tracing::{debug, warn};

/// SSH client handler for russh
///
/// Verifies the server key against an optional pinned SHA-256 fingerprint.
/// Without a pin every server key is accepted, which suits brokers running
/// in throwaway containers.
#[derive(Debug, Clone, Default)]
pub struct SshHandler {
    expected_fingerprint: Option<String>,
}

impl SshHandler {
    /// Create a new SSH handler that accepts any host key
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handler that only accepts the given `SHA256:` fingerprint
    pub fn with_fingerprint(fingerprint: impl Into<String>) -> Self {
        Self {
            expected_fingerprint: Some(fingerprint.into()),
        }
    }

    fn accepts(&self, fingerprint: &str) -> bool {
        match self.expected_fingerprint {
            Some(ref expected) => expected.trim() == fingerprint,
            None => true,
        }
    }
}

impl russh::client::Handler for SshHandler {
    type Error = anyhow::Error;

    /// Verify the server's host key
    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        debug!("Server host key fingerprint: {}", fingerprint);

        let accepted = self.accepts(&fingerprint);
        if !accepted {
            warn!("Rejecting server host key {}", fingerprint);
        }
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_creation() {
        let handler = SshHandler::new();
        assert!(format!("{:?}", handler).contains("SshHandler"));
        assert!(handler.accepts("SHA256:anything"));
    }

    #[test]
    fn test_handler_pinned_fingerprint() {
        let handler = SshHandler::with_fingerprint("SHA256:abc ");
        assert!(handler.accepts("SHA256:abc"));
        assert!(!handler.accepts("SHA256:def"));
    }
}
