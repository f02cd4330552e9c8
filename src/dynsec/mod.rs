//! Mosquitto dynamic security administration
//!
//! Operations are run as `mosquitto_ctrl dynsec ...` command lines on a
//! remote host through a [`CommandTransport`]. Secrets are written to the
//! command's stdin, and stderr is scanned for broker rejections.

pub mod acl;
pub mod classify;
pub mod client;
pub mod executor;
pub mod logger;
pub mod transport;

// Re-exports
pub use acl::{AclType, Permission};
pub use classify::{classify, ConnectionError, CONNECTION_ERROR_MARKER};
pub use client::{Dynsec, DEFAULT_CLIENT_CONFIG_FILE, DEFAULT_CTRL_BINARY};
pub use executor::{build_stdin, execute};
pub use logger::{CommandLogger, TracingLogger};
pub use transport::{CommandOutput, CommandTransport};
