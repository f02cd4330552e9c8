//! SSH transport for dynsec commands
//!
//! This module provides a persistent SSH connection, password or key
//! authentication, and a [`crate::dynsec::CommandTransport`] implementation
//! that runs each command on its own exec channel.

pub mod command;
pub mod config;
pub mod connection;
pub mod handler;
pub mod sanitize;

// Re-exports
pub use config::SshConfig;
pub use connection::SshConnectionManager;
pub use handler::SshHandler;
pub use sanitize::{escape_for_shell, shell_quote};
