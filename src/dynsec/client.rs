//! Administrative operations on the dynamic security plugin
//!
//! Each operation only formats a `mosquitto_ctrl` command line (plus any
//! values the tool prompts for) and hands it to [`execute`].

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::acl::{AclType, Permission};
use super::executor::execute;
use super::logger::CommandLogger;
use super::transport::CommandTransport;
use crate::error::Result;
use crate::ssh::sanitize::{shell_quote, validate_name, validate_secret};

/// Default location of the dynamic security store in the official Docker image
pub const DEFAULT_CLIENT_CONFIG_FILE: &str = "/mosquitto/config/dynamic-security.json";

/// Name of the control binary on the remote host
pub const DEFAULT_CTRL_BINARY: &str = "mosquitto_ctrl";

/// Remote `mosquitto_ctrl dynsec` client
///
/// Holds a shared transport and the administrative identity used for every
/// operation. Operations are independent: callers that need ordering (a role
/// must exist before it is assigned) must await them in sequence.
pub struct Dynsec<T> {
    transport: Arc<T>,
    admin_username: String,
    admin_password: String,
    binary: String,
    logger: Option<Arc<dyn CommandLogger>>,
}

impl<T: CommandTransport> Dynsec<T> {
    /// Create a client using `mosquitto_ctrl` from the remote `PATH`
    pub fn new(
        transport: Arc<T>,
        admin_username: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
            binary: DEFAULT_CTRL_BINARY.to_string(),
            logger: None,
        }
    }

    /// Use a different control binary (e.g. an absolute path)
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Install an audit hook called after every command
    pub fn with_logger(mut self, logger: Arc<dyn CommandLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Initialize a new dynamic security store at `config_file`
    ///
    /// The tool asks for the admin password twice before the final prompt.
    pub async fn init(&self, config_file: &str) -> Result<()> {
        validate_name("Config file", config_file)?;
        let command = format!(
            "{} dynsec init {} {}",
            self.binary,
            shell_quote(config_file),
            shell_quote(&self.admin_username)
        );
        let password = self.admin_password.as_str();
        self.run(&command, &[password, password]).await
    }

    /// Initialize the store at [`DEFAULT_CLIENT_CONFIG_FILE`]
    pub async fn init_default(&self) -> Result<()> {
        self.init(DEFAULT_CLIENT_CONFIG_FILE).await
    }

    /// Create an empty role
    pub async fn create_role(&self, name: &str) -> Result<()> {
        validate_name("Role name", name)?;
        let command = self.admin_command(&["createRole", name]);
        self.run(&command, &[]).await
    }

    /// Delete a role; clients holding it lose its ACLs
    pub async fn delete_role(&self, name: &str) -> Result<()> {
        validate_name("Role name", name)?;
        let command = self.admin_command(&["deleteRole", name]);
        self.run(&command, &[]).await
    }

    /// Attach an ACL entry to a role
    pub async fn add_role_acl(
        &self,
        role: &str,
        acl_type: AclType,
        topic_filter: &str,
        permission: Permission,
        priority: i32,
    ) -> Result<()> {
        validate_name("Role name", role)?;
        validate_name("Topic filter", topic_filter)?;
        let priority = priority.to_string();
        let command = self.admin_command(&[
            "addRoleACL",
            role,
            acl_type.as_str(),
            topic_filter,
            permission.as_str(),
            &priority,
        ]);
        self.run(&command, &[]).await
    }

    /// Create a client; the tool asks for its password and a confirmation
    pub async fn create_client(&self, name: &str, password: &str) -> Result<()> {
        validate_name("Client name", name)?;
        validate_secret("Client password", password)?;
        let command = self.admin_command(&["createClient", name]);
        self.run(&command, &[password, password]).await
    }

    /// Delete a client
    pub async fn delete_client(&self, name: &str) -> Result<()> {
        validate_name("Client name", name)?;
        let command = self.admin_command(&["deleteClient", name]);
        self.run(&command, &[]).await
    }

    /// Assign an existing role to an existing client
    pub async fn add_client_role(&self, client: &str, role: &str) -> Result<()> {
        validate_name("Client name", client)?;
        validate_name("Role name", role)?;
        let command = self.admin_command(&["addClientRole", client, role]);
        self.run(&command, &[]).await
    }

    /// `<binary> -u <admin> dynsec <args...>`
    fn admin_command(&self, args: &[&str]) -> String {
        let mut command = format!(
            "{} -u {} dynsec",
            self.binary,
            shell_quote(&self.admin_username)
        );
        for arg in args {
            command.push(' ');
            command.push_str(&shell_quote(arg));
        }
        command
    }

    async fn run(&self, command: &str, secret_lines: &[&str]) -> Result<()> {
        // The admin password must stay the single last stdin line
        validate_secret("Admin password", &self.admin_password)?;
        execute(
            self.transport.as_ref(),
            command,
            secret_lines,
            &self.admin_password,
            self.logger.as_deref(),
        )
        .await?;
        info!("dynsec command succeeded: {}", command);
        Ok(())
    }
}

impl<T> Clone for Dynsec<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            admin_username: self.admin_username.clone(),
            admin_password: self.admin_password.clone(),
            binary: self.binary.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl<T> fmt::Debug for Dynsec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynsec")
            .field("admin_username", &self.admin_username)
            .field("binary", &self.binary)
            .field("has_logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}
