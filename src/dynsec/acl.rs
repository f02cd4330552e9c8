//! ACL vocabulary understood by `mosquitto_ctrl dynsec addRoleACL`

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::DynsecError;

/// Kind of access an ACL entry governs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum AclType {
    /// Publishing from a client to the broker
    PublishClientSend,
    /// Delivery of published messages to a client
    PublishClientReceive,
    /// Subscribing with a literal topic filter
    SubscribeLiteral,
    /// Subscribing with a wildcard pattern
    SubscribePattern,
    UnsubscribeLiteral,
    UnsubscribePattern,
}

impl AclType {
    pub const ALL: [AclType; 6] = [
        AclType::PublishClientSend,
        AclType::PublishClientReceive,
        AclType::SubscribeLiteral,
        AclType::SubscribePattern,
        AclType::UnsubscribeLiteral,
        AclType::UnsubscribePattern,
    ];

    /// Name as passed on the `mosquitto_ctrl` command line
    pub fn as_str(&self) -> &'static str {
        match self {
            AclType::PublishClientSend => "publishClientSend",
            AclType::PublishClientReceive => "publishClientReceive",
            AclType::SubscribeLiteral => "subscribeLiteral",
            AclType::SubscribePattern => "subscribePattern",
            AclType::UnsubscribeLiteral => "unsubscribeLiteral",
            AclType::UnsubscribePattern => "unsubscribePattern",
        }
    }
}

impl fmt::Display for AclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AclType {
    type Err = DynsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AclType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DynsecError::invalid_params(format!("Unknown ACL type: {}", s)))
    }
}

/// Whether an ACL entry grants or refuses access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Allow,
    Deny,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Allow => "allow",
            Permission::Deny => "deny",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = DynsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Permission::Allow),
            "deny" => Ok(Permission::Deny),
            _ => Err(DynsecError::invalid_params(format!(
                "Permission must be 'allow' or 'deny', got '{}'",
                s
            ))),
        }
    }
}

impl From<bool> for Permission {
    fn from(allow: bool) -> Self {
        if allow {
            Permission::Allow
        } else {
            Permission::Deny
        }
    }
}
