//! dynsec-mcp - Mosquitto dynamic security administration over SSH
//!
//! This crate drives the Mosquitto dynamic security plugin by running
//! `mosquitto_ctrl dynsec ...` on a remote host over SSH. Passwords are fed
//! to the command's stdin, and broker rejections printed as
//! `Connection error: <reason>` are returned as typed errors.
//!
//! The library part ([`dynsec`]) is transport-agnostic; [`ssh`] provides the
//! `russh` transport and [`server`] exposes the operations as MCP tools.
//!
//! # MCP Tools
//!
//! - `dynsec-init`
//! - `dynsec-create-role`, `dynsec-delete-role`, `dynsec-add-role-acl`
//! - `dynsec-create-client`, `dynsec-delete-client`, `dynsec-add-client-role`
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! dynsec-mcp --host=broker.local --port=1882 --user=admin --password=admin \
//!   --admin-user=admin --admin-password=admin
//! ```

pub mod config;
pub mod dynsec;
pub mod error;
pub mod server;
pub mod ssh;
pub mod tools;

// Re-exports for convenience
pub use config::{Args, Config};
pub use dynsec::{
    classify, AclType, CommandLogger, CommandOutput, CommandTransport, ConnectionError, Dynsec,
    Permission, TracingLogger,
};
pub use error::{DynsecError, Result};
pub use server::DynsecMcpServer;
pub use ssh::{SshConfig, SshConnectionManager, SshHandler};
