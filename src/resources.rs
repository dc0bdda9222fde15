// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state declarations for every resource kind.
//!
//! These are the records a declaration file deserialises into. Every optional
//! attribute carries the default the appliance itself would apply, so that a
//! minimal declaration converges to a stable state.
//!
//! # Example
//!
//! ```rust
//! use ltmsync::resources::VirtualServerSpec;
//!
//! let vs: VirtualServerSpec = serde_yaml::from_str(r#"
//! name: www
//! destination_address: 10.1.1.10
//! destination_port: "443"
//! default_pool: web
//! rules: [redirect, log]
//! "#).unwrap();
//!
//! assert_eq!(vs.destination_port, 443);
//! assert_eq!(vs.destination_wildmask, "255.255.255.255");
//! assert_eq!(vs.profiles[0].profile_name, "/Common/tcp");
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_MONITOR_DEST_IP, DEFAULT_MONITOR_DEST_PORT, DEFAULT_MONITOR_INTERVAL_SECS,
    DEFAULT_MONITOR_PARENT, DEFAULT_MONITOR_TIMEOUT_SECS, DEFAULT_NODE_DESCRIPTION,
    DEFAULT_SERVICE_PORT, DEFAULT_SOURCE_ADDRESS, DEFAULT_VIRTUAL_SERVER_PROFILE,
    DEFAULT_WILDMASK,
};
use crate::errors::ContractError;
use crate::icontrol::types::{
    AddressType, EnabledState, LbMethod, ManagementMode, MemberAddress, ProfileAttribute,
    ProfileContext, Protocol, ResourceType, SnatType, StringPropertyType,
};

fn default_true() -> bool {
    true
}

fn default_node_description() -> String {
    DEFAULT_NODE_DESCRIPTION.to_string()
}

fn default_wildmask() -> String {
    DEFAULT_WILDMASK.to_string()
}

fn default_source_address() -> String {
    DEFAULT_SOURCE_ADDRESS.to_string()
}

fn default_vlan_state() -> EnabledState {
    EnabledState::Disabled
}

fn default_profiles() -> Vec<ProfileAttribute> {
    vec![ProfileAttribute {
        profile_context: ProfileContext::All,
        profile_name: DEFAULT_VIRTUAL_SERVER_PROFILE.to_string(),
    }]
}

fn default_monitor_parent() -> String {
    DEFAULT_MONITOR_PARENT.to_string()
}

fn default_monitor_interval() -> u32 {
    DEFAULT_MONITOR_INTERVAL_SECS
}

fn default_monitor_timeout() -> u32 {
    DEFAULT_MONITOR_TIMEOUT_SECS
}

fn default_monitor_dest_ip() -> String {
    DEFAULT_MONITOR_DEST_IP.to_string()
}

fn default_monitor_dest_port() -> u16 {
    DEFAULT_MONITOR_DEST_PORT
}

fn default_service_port() -> u16 {
    DEFAULT_SERVICE_PORT
}

/// Accepts a port written either as a number or as a string.
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        Text(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{text}'"))),
    }
}

/// A node address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// Node name, bare or folder-qualified.
    pub name: String,

    /// Node IP address. Defaults to the node name.
    #[serde(default)]
    pub address: Option<String>,

    /// Whether the node should accept new sessions.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_node_description")]
    pub description: String,

    /// Keep the enabled state of an existing node as found on the device,
    /// so an operator's out-of-band disable is not undone.
    #[serde(default = "default_true")]
    pub preserve_status: bool,
}

impl NodeSpec {
    /// A node named after its address, with every default applied.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            enabled: true,
            description: default_node_description(),
            preserve_status: true,
        }
    }

    /// Address to converge to.
    #[must_use]
    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.name)
    }
}

/// A pool member: an existing node address and a service port.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolMemberSpec {
    pub address: String,

    /// Service port, written as a number or a string.
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
}

impl From<&PoolMemberSpec> for MemberAddress {
    fn from(member: &PoolMemberSpec) -> Self {
        Self {
            address: member.address.clone(),
            port: member.port,
        }
    }
}

/// A pool of members with health monitors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSpec {
    pub name: String,

    /// Load-balancing method, e.g. `ROUND_ROBIN` or `LB_METHOD_ROUND_ROBIN`.
    #[serde(default)]
    pub lb_method: LbMethod,

    #[serde(default)]
    pub members: Vec<PoolMemberSpec>,

    /// Monitor templates that must all pass for a member to be up.
    ///
    /// The monitors must already exist on the device.
    #[serde(default)]
    pub monitors: Vec<String>,

    #[serde(default)]
    pub description: String,
}

/// A virtual server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualServerSpec {
    pub name: String,

    pub destination_address: String,

    /// Destination port, written as a number or a string.
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub destination_port: u16,

    #[serde(default = "default_wildmask")]
    pub destination_wildmask: String,

    /// Source address filter in `address/prefix` form.
    #[serde(default = "default_source_address")]
    pub source_address: String,

    #[serde(default, rename = "type")]
    pub resource_type: ResourceType,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default)]
    pub description: String,

    /// Pool receiving traffic; empty for none.
    #[serde(default)]
    pub default_pool: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_vlan_state")]
    pub vlan_state: EnabledState,

    #[serde(default)]
    pub vlans: Vec<String>,

    #[serde(default)]
    pub translate_address: bool,

    #[serde(default)]
    pub translate_port: bool,

    /// Profiles bound to the server. Order is not significant.
    #[serde(default = "default_profiles")]
    pub profiles: Vec<ProfileAttribute>,

    #[serde(default)]
    pub snat_type: SnatType,

    /// SNAT pool, required when `snat_type` is `SNATPOOL`.
    #[serde(default)]
    pub snat_pool: String,

    #[serde(default)]
    pub default_persistence_profile: String,

    #[serde(default)]
    pub fallback_persistence_profile: String,

    /// iRules in execution order; the first runs with priority 1.
    #[serde(default)]
    pub rules: Vec<String>,
}

impl VirtualServerSpec {
    /// Reject declarations the device would refuse half-way through.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidDeclaration`] for a SNAT pool mode
    /// without a pool.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.snat_type == SnatType::SnatPool && self.snat_pool.is_empty() {
            return Err(ContractError::InvalidDeclaration {
                resource: self.name.clone(),
                reason: "snat_type SRC_TRANS_SNATPOOL requires snat_pool".to_string(),
            });
        }
        Ok(())
    }
}

/// A load-balanced service: one node per backend address, a pool of those
/// nodes on `member_port`, and a virtual server in front of the pool.
///
/// Expands into ordinary node, pool and virtual server declarations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VipSpec {
    /// Virtual server name.
    pub name: String,

    /// Pool name.
    pub pool: String,

    /// Backend addresses; each becomes a node named after its address.
    pub nodes: Vec<String>,

    #[serde(
        default = "default_service_port",
        deserialize_with = "port_from_number_or_string"
    )]
    pub member_port: u16,

    #[serde(default)]
    pub lb_method: LbMethod,

    #[serde(default)]
    pub monitors: Vec<String>,

    pub destination_address: String,

    #[serde(
        default = "default_service_port",
        deserialize_with = "port_from_number_or_string"
    )]
    pub destination_port: u16,

    #[serde(default = "default_vlan_state")]
    pub vlan_state: EnabledState,

    #[serde(default)]
    pub vlans: Vec<String>,

    #[serde(default = "default_profiles")]
    pub profiles: Vec<ProfileAttribute>,

    #[serde(default)]
    pub snat_type: SnatType,

    #[serde(default)]
    pub snat_pool: String,

    #[serde(default)]
    pub default_persistence_profile: String,

    #[serde(default)]
    pub fallback_persistence_profile: String,

    #[serde(default)]
    pub rules: Vec<String>,
}

impl VipSpec {
    #[must_use]
    pub fn node_specs(&self) -> Vec<NodeSpec> {
        self.nodes.iter().map(|n| NodeSpec::new(n.as_str())).collect()
    }

    #[must_use]
    pub fn pool_spec(&self) -> PoolSpec {
        PoolSpec {
            name: self.pool.clone(),
            lb_method: self.lb_method,
            members: self
                .nodes
                .iter()
                .map(|address| PoolMemberSpec {
                    address: address.clone(),
                    port: self.member_port,
                })
                .collect(),
            monitors: self.monitors.clone(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn virtual_server_spec(&self) -> VirtualServerSpec {
        VirtualServerSpec {
            name: self.name.clone(),
            destination_address: self.destination_address.clone(),
            destination_port: self.destination_port,
            destination_wildmask: default_wildmask(),
            source_address: default_source_address(),
            resource_type: ResourceType::default(),
            protocol: Protocol::default(),
            description: String::new(),
            default_pool: self.pool.clone(),
            enabled: true,
            vlan_state: self.vlan_state,
            vlans: self.vlans.clone(),
            translate_address: false,
            translate_port: false,
            profiles: self.profiles.clone(),
            snat_type: self.snat_type,
            snat_pool: self.snat_pool.clone(),
            default_persistence_profile: self.default_persistence_profile.clone(),
            fallback_persistence_profile: self.fallback_persistence_profile.clone(),
            rules: self.rules.clone(),
        }
    }
}

/// A health monitor template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSpec {
    pub name: String,

    /// Template this monitor derives from; it determines the monitor type.
    #[serde(default = "default_monitor_parent")]
    pub parent: String,

    /// Seconds between probes.
    #[serde(default = "default_monitor_interval")]
    pub interval: u32,

    /// Seconds without a successful probe before a member is marked down.
    #[serde(default = "default_monitor_timeout")]
    pub timeout: u32,

    #[serde(default)]
    pub dest_addr_type: AddressType,

    #[serde(default = "default_monitor_dest_ip")]
    pub dest_addr_ip: String,

    #[serde(default = "default_monitor_dest_port")]
    pub dest_addr_port: u16,

    #[serde(default)]
    pub description: String,

    /// Type-specific string properties such as `SEND` or `RECEIVE`.
    #[serde(default)]
    pub user_values: BTreeMap<StringPropertyType, String>,
}

/// An address or string data class.
///
/// Address class keys are `address` or `address/netmask`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataClassSpec {
    pub name: String,

    /// Member keys and their values.
    #[serde(default)]
    pub records: BTreeMap<String, String>,
}

/// An iRule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IRuleSpec {
    pub name: String,

    /// Rule body.
    #[serde(default)]
    pub content: Option<String>,

    /// File whose contents become the rule body when `content` is absent.
    #[serde(default)]
    pub template: Option<PathBuf>,
}

impl IRuleSpec {
    /// The rule body.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MissingRuleDefinition`] if no content has been
    /// supplied or resolved from the template.
    pub fn definition(&self) -> Result<&str, ContractError> {
        self.content
            .as_deref()
            .ok_or_else(|| ContractError::MissingRuleDefinition {
                rule: self.name.clone(),
            })
    }
}

/// An SSL certificate and optional key stored under one name.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SslCertSpec {
    pub name: String,

    /// PEM certificate; empty when the certificate is not managed.
    #[serde(default)]
    pub cert: String,

    /// PEM key; empty when the key is not managed.
    #[serde(default)]
    pub key: String,

    /// File to read `cert` from.
    #[serde(default)]
    pub cert_file: Option<PathBuf>,

    /// File to read `key` from.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Replace an existing certificate or key. Without it, existing material is
    /// left untouched even when it differs.
    #[serde(default, rename = "override")]
    pub override_existing: bool,

    #[serde(default)]
    pub mode: ManagementMode,
}

impl std::fmt::Debug for SslCertSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SslCertSpec")
            .field("name", &self.name)
            .field("cert_len", &self.cert.len())
            .field("key_len", &self.key.len())
            .field("cert_file", &self.cert_file)
            .field("key_file", &self.key_file)
            .field("override_existing", &self.override_existing)
            .field("mode", &self.mode)
            .finish()
    }
}
