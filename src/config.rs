//! Configuration and CLI argument parsing for dynsec-mcp

use clap::Parser;
use std::path::PathBuf;

use crate::dynsec::{DEFAULT_CLIENT_CONFIG_FILE, DEFAULT_CTRL_BINARY};
use crate::error::{DynsecError, Result};

/// Default timeout for a remote command in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000; // 60 seconds

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// dynsec-mcp CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "dynsec-mcp")]
#[command(version)]
#[command(about = "MCP server managing Mosquitto dynamic security over SSH via mosquitto_ctrl")]
pub struct Args {
    /// SSH host running the broker (or a container with mosquitto_ctrl)
    #[arg(long, env = "DYNSEC_MCP_HOST")]
    pub host: String,

    /// SSH port
    #[arg(long, default_value = "22", env = "DYNSEC_MCP_PORT")]
    pub port: u16,

    /// SSH username
    #[arg(long, env = "DYNSEC_MCP_USER")]
    pub user: String,

    /// SSH password (alternative to key)
    #[arg(long, env = "DYNSEC_MCP_PASSWORD")]
    pub password: Option<String>,

    /// Path to SSH private key file (alternative to password)
    #[arg(long, env = "DYNSEC_MCP_KEY")]
    pub key: Option<PathBuf>,

    /// Expected SSH host key fingerprint, e.g. "SHA256:..."
    #[arg(long, env = "DYNSEC_MCP_HOST_KEY_FINGERPRINT")]
    pub host_key_fingerprint: Option<String>,

    /// Remote command timeout in milliseconds (0 disables the limit)
    #[arg(long, default_value = "60000", env = "DYNSEC_MCP_TIMEOUT")]
    pub timeout: u64,

    /// Dynamic security admin username
    #[arg(long, env = "DYNSEC_MCP_ADMIN_USER")]
    pub admin_user: String,

    /// Dynamic security admin password
    #[arg(long, env = "DYNSEC_MCP_ADMIN_PASSWORD")]
    pub admin_password: String,

    /// Control binary invoked on the remote host
    #[arg(long, default_value = DEFAULT_CTRL_BINARY, env = "DYNSEC_MCP_CTRL_BINARY")]
    pub ctrl_binary: String,

    /// Dynamic security store used by `dynsec-init` when none is given
    #[arg(long, default_value = DEFAULT_CLIENT_CONFIG_FILE, env = "DYNSEC_MCP_CONFIG_FILE")]
    pub dynsec_config: String,
}

/// Parsed and validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SSH host
    pub host: String,

    /// SSH port
    pub port: u16,

    /// SSH username
    pub user: String,

    /// SSH password
    pub password: Option<String>,

    /// Path to SSH private key
    pub key: Option<PathBuf>,

    /// Pinned host key fingerprint
    pub host_key_fingerprint: Option<String>,

    /// Command timeout in milliseconds (None = unlimited)
    pub timeout_ms: Option<u64>,

    /// Admin identity for mosquitto_ctrl
    pub admin_user: String,
    pub admin_password: String,

    /// Remote control binary
    pub ctrl_binary: String,

    /// Default dynsec store path
    pub dynsec_config: String,
}

impl Config {
    /// Create Config from CLI Args
    pub fn from_args(args: Args) -> Result<Self> {
        validate_args(&args)?;

        Ok(Config {
            host: args.host,
            port: args.port,
            user: args.user,
            password: sanitize_password(args.password),
            key: args.key,
            host_key_fingerprint: args
                .host_key_fingerprint
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty()),
            timeout_ms: parse_timeout(args.timeout),
            admin_user: args.admin_user,
            admin_password: args.admin_password,
            ctrl_binary: args.ctrl_binary,
            dynsec_config: args.dynsec_config,
        })
    }
}

/// Validate CLI arguments
fn validate_args(args: &Args) -> Result<()> {
    let mut errors = Vec::new();

    if args.host.is_empty() {
        errors.push("Missing required --host".to_string());
    }

    if args.user.is_empty() {
        errors.push("Missing required --user".to_string());
    }

    // Must have either password or key
    if args.password.is_none() && args.key.is_none() {
        errors.push("Must provide either --password or --key".to_string());
    }

    if let Some(ref key_path) = args.key {
        if !key_path.exists() {
            errors.push(format!("SSH key file not found: {}", key_path.display()));
        }
    }

    if args.admin_user.trim().is_empty() {
        errors.push("Missing required --admin-user".to_string());
    }

    if args.admin_password.is_empty() {
        errors.push("Missing required --admin-password".to_string());
    } else if args.admin_password.contains(['\n', '\r']) {
        errors.push("--admin-password must be a single line".to_string());
    }

    if args.ctrl_binary.trim().is_empty() {
        errors.push("--ctrl-binary cannot be empty".to_string());
    }

    if let Some(ref fingerprint) = args.host_key_fingerprint {
        let fingerprint = fingerprint.trim();
        if !fingerprint.is_empty() && !fingerprint.starts_with("SHA256:") {
            errors.push(format!(
                "--host-key-fingerprint must start with SHA256:, got {}",
                fingerprint
            ));
        }
    }

    if !errors.is_empty() {
        return Err(DynsecError::config(errors.join("\n")));
    }

    Ok(())
}

/// Parse timeout argument: 0 → unlimited
pub fn parse_timeout(timeout_ms: u64) -> Option<u64> {
    (timeout_ms > 0).then_some(timeout_ms)
}

/// Sanitize password: return None if empty
fn sanitize_password(password: Option<String>) -> Option<String> {
    password.filter(|p| !p.is_empty())
}
