//! MCP tool parameters
//!
//! One struct per dynsec tool. The server derives each tool's input schema
//! from these types and deserializes call arguments into them.
//!
//! Available tools:
//! - `dynsec-init` - Initialize the dynamic security store
//! - `dynsec-create-role` / `dynsec-delete-role`
//! - `dynsec-add-role-acl` - Attach an ACL entry to a role
//! - `dynsec-create-client` / `dynsec-delete-client`
//! - `dynsec-add-client-role` - Assign a role to a client

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dynsec::{AclType, Permission};

/// Parameters for the dynsec-init tool
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct InitParams {
    /// Path of the dynamic security JSON file on the remote host.
    /// Defaults to the server's configured path.
    #[serde(default)]
    pub config_file: Option<String>,
}

/// Parameters for the dynsec-create-role and dynsec-delete-role tools
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RoleParams {
    /// Role name
    pub name: String,
}

/// Parameters for the dynsec-add-role-acl tool
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct AddRoleAclParams {
    /// Role receiving the ACL entry
    pub role: String,

    /// ACL type, e.g. publishClientSend or subscribeLiteral
    pub acl_type: AclType,

    /// MQTT topic filter the entry applies to
    pub topic_filter: String,

    /// allow or deny
    pub permission: Permission,

    /// Priority of the entry; higher values are checked first
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    -1
}

/// Parameters for the dynsec-create-client tool
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateClientParams {
    /// Client username
    pub name: String,

    /// Password the client will authenticate with
    pub password: String,
}

/// Parameters for the dynsec-delete-client tool
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ClientParams {
    /// Client username
    pub name: String,
}

/// Parameters for the dynsec-add-client-role tool
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct AddClientRoleParams {
    /// Client username
    pub client: String,

    /// Role to assign
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_params_optional_file() {
        let params: InitParams = serde_json::from_str("{}").unwrap();
        assert!(params.config_file.is_none());

        let params: InitParams =
            serde_json::from_str(r#"{"config_file": "/tmp/dynsec.json"}"#).unwrap();
        assert_eq!(params.config_file.as_deref(), Some("/tmp/dynsec.json"));
    }

    #[test]
    fn test_add_role_acl_params_deserialize() {
        let json = r#"{
            "role": "time",
            "acl_type": "subscribeLiteral",
            "topic_filter": "time_current",
            "permission": "allow",
            "priority": 1
        }"#;
        let params: AddRoleAclParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.acl_type, AclType::SubscribeLiteral);
        assert_eq!(params.permission, Permission::Allow);
        assert_eq!(params.priority, 1);
    }

    #[test]
    fn test_add_role_acl_params_default_priority() {
        let json = r#"{"role": "r", "acl_type": "publishClientSend", "topic_filter": "t", "permission": "deny"}"#;
        let params: AddRoleAclParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.priority, -1);
    }

    #[test]
    fn test_add_role_acl_params_rejects_unknown_type() {
        let json = r#"{"role": "r", "acl_type": "publish", "topic_filter": "t", "permission": "allow"}"#;
        assert!(serde_json::from_str::<AddRoleAclParams>(json).is_err());
    }

    #[test]
    fn test_create_client_params_deserialize() {
        let json = r#"{"name": "time_publisher", "password": "123"}"#;
        let params: CreateClientParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.name, "time_publisher");
        assert_eq!(params.password, "123");
    }
}
