//! MCP Server implementation
//!
//! Exposes every dynsec operation as an MCP tool backed by an SSH
//! connection to the broker host.

use std::sync::Arc;
use std::time::Duration;

use rmcp::{
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::dynsec::{CommandTransport, Dynsec, TracingLogger};
use crate::error::{DynsecError, Result};
use crate::ssh::{SshConfig, SshConnectionManager};
use crate::tools::{
    AddClientRoleParams, AddRoleAclParams, ClientParams, CreateClientParams, InitParams,
    RoleParams,
};

/// dynsec MCP Server
///
/// Generic over the transport so the tool layer can run without SSH; the
/// binary always uses [`SshConnectionManager`].
pub struct DynsecMcpServer<T = SshConnectionManager> {
    /// Server configuration
    config: Config,

    /// dynsec client running over the transport
    dynsec: Dynsec<T>,
}

impl<T> Clone for DynsecMcpServer<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            dynsec: self.dynsec.clone(),
        }
    }
}

impl DynsecMcpServer<SshConnectionManager> {
    /// Create a new dynsec MCP Server over SSH
    ///
    /// Connection is not established until a tool is actually used.
    pub async fn new(config: Config) -> Result<Self> {
        let mut ssh_config = SshConfig::new(&config.host, &config.user).with_port(config.port);

        if let Some(ref password) = config.password {
            ssh_config = ssh_config.with_password(password);
        }

        if let Some(ref key_path) = config.key {
            let key_content = tokio::fs::read_to_string(key_path)
                .await
                .map_err(DynsecError::Io)?;
            ssh_config = ssh_config.with_private_key(&key_content);
        }

        if let Some(ref fingerprint) = config.host_key_fingerprint {
            ssh_config = ssh_config.with_host_key_fingerprint(fingerprint);
        }

        if let Some(timeout_ms) = config.timeout_ms {
            ssh_config = ssh_config.with_command_timeout(Duration::from_millis(timeout_ms));
        }

        let connection = Arc::new(SshConnectionManager::new(ssh_config));

        let dynsec = Dynsec::new(
            Arc::clone(&connection),
            &config.admin_user,
            &config.admin_password,
        )
        .with_binary(&config.ctrl_binary)
        .with_logger(Arc::new(TracingLogger));

        Ok(Self::from_dynsec(config, dynsec))
    }

    /// Get a reference to the SSH connection manager
    pub fn connection(&self) -> &Arc<SshConnectionManager> {
        self.dynsec.transport()
    }

    /// Close the server and cleanup resources
    pub async fn shutdown(&self) {
        info!("Shutting down dynsec MCP Server...");
        self.connection().close().await;
    }
}

impl<T: CommandTransport> DynsecMcpServer<T> {
    /// Serve an already configured dynsec client
    pub fn from_dynsec(config: Config, dynsec: Dynsec<T>) -> Self {
        Self { config, dynsec }
    }

    /// Run one tool and turn its outcome into a tool result
    async fn dispatch(
        &self,
        tool_name: &str,
        args: JsonObject,
    ) -> std::result::Result<CallToolResult, McpError> {
        let (outcome, summary) = match tool_name {
            "dynsec-init" => {
                let params: InitParams = parse_params(args)?;
                let file = params
                    .config_file
                    .unwrap_or_else(|| self.config.dynsec_config.clone());
                let outcome = self.dynsec.init(&file).await;
                (outcome, format!("Initialized dynamic security store {}", file))
            }
            "dynsec-create-role" => {
                let params: RoleParams = parse_params(args)?;
                let outcome = self.dynsec.create_role(&params.name).await;
                (outcome, format!("Created role '{}'", params.name))
            }
            "dynsec-delete-role" => {
                let params: RoleParams = parse_params(args)?;
                let outcome = self.dynsec.delete_role(&params.name).await;
                (outcome, format!("Deleted role '{}'", params.name))
            }
            "dynsec-add-role-acl" => {
                let params: AddRoleAclParams = parse_params(args)?;
                let outcome = self
                    .dynsec
                    .add_role_acl(
                        &params.role,
                        params.acl_type,
                        &params.topic_filter,
                        params.permission,
                        params.priority,
                    )
                    .await;
                (
                    outcome,
                    format!(
                        "Added {} {} ACL on '{}' to role '{}' (priority {})",
                        params.permission,
                        params.acl_type,
                        params.topic_filter,
                        params.role,
                        params.priority
                    ),
                )
            }
            "dynsec-create-client" => {
                let params: CreateClientParams = parse_params(args)?;
                let outcome = self
                    .dynsec
                    .create_client(&params.name, &params.password)
                    .await;
                (outcome, format!("Created client '{}'", params.name))
            }
            "dynsec-delete-client" => {
                let params: ClientParams = parse_params(args)?;
                let outcome = self.dynsec.delete_client(&params.name).await;
                (outcome, format!("Deleted client '{}'", params.name))
            }
            "dynsec-add-client-role" => {
                let params: AddClientRoleParams = parse_params(args)?;
                let outcome = self
                    .dynsec
                    .add_client_role(&params.client, &params.role)
                    .await;
                (
                    outcome,
                    format!(
                        "Assigned role '{}' to client '{}'",
                        params.role, params.client
                    ),
                )
            }
            _ => {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", tool_name),
                    None,
                ))
            }
        };

        match outcome {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(summary)])),
            Err(e) => {
                error!("{} failed: {}", tool_name, e);
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error: {}",
                    e
                ))]))
            }
        }
    }

    /// Definitions of every tool this server offers
    fn tools() -> Vec<Tool> {
        vec![
            tool::<InitParams>(
                "dynsec-init",
                "Initialize a Mosquitto dynamic security store with the configured admin user.",
            ),
            tool::<RoleParams>("dynsec-create-role", "Create a dynamic security role."),
            tool::<RoleParams>("dynsec-delete-role", "Delete a dynamic security role."),
            tool::<AddRoleAclParams>(
                "dynsec-add-role-acl",
                "Add an ACL entry (type, topic filter, allow/deny, priority) to a role.",
            ),
            tool::<CreateClientParams>(
                "dynsec-create-client",
                "Create a client that can authenticate to the broker with the given password.",
            ),
            tool::<ClientParams>("dynsec-delete-client", "Delete a client."),
            tool::<AddClientRoleParams>(
                "dynsec-add-client-role",
                "Assign an existing role to an existing client.",
            ),
        ]
    }
}

/// Build a tool whose input schema is derived from `P`
fn tool<P: JsonSchema>(name: &'static str, description: &'static str) -> Tool {
    let schema = serde_json::to_value(schemars::schema_for!(P)).unwrap_or_default();

    // Convert Value to JsonObject (Map<String, Value>)
    let schema_obj = schema.as_object().cloned().unwrap_or_default();

    Tool::new(name, description, Arc::new(schema_obj))
}

fn parse_params<P: DeserializeOwned>(args: JsonObject) -> std::result::Result<P, McpError> {
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|e| McpError::invalid_params(format!("Invalid arguments: {}", e), None))
}

impl<T: CommandTransport + 'static> ServerHandler for DynsecMcpServer<T> {
    /// Return server information
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "dynsec MCP Server v{} - Manage Mosquitto dynamic security as '{}' via {}@{}:{}",
                env!("CARGO_PKG_VERSION"),
                self.config.admin_user,
                self.config.user,
                self.config.host,
                self.config.port,
            )),
        }
    }

    /// List available tools
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        debug!("list_tools called");

        Ok(ListToolsResult {
            tools: Self::tools(),
            next_cursor: None,
            meta: Default::default(),
        })
    }

    /// Call a tool
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let tool_name: &str = request.name.as_ref();
        debug!("call_tool called: {:?}", tool_name);

        let args = request.arguments.unwrap_or_default();
        self.dispatch(tool_name, args).await
    }
}
