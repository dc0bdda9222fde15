// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types for the management API.
//!
//! Enumerations are the device's prefixed constants (see `wire_enum!`);
//! structures mirror the records the API accepts and returns, field for field.

use serde::{Deserialize, Serialize};

wire_enum! {
    /// Enabled/disabled state used by setters across families
    pub enum EnabledState: "STATE_" {
        Enabled => "ENABLED",
        Disabled => "DISABLED",
    }
}

impl EnabledState {
    /// Maps a boolean flag to its state constant.
    #[must_use]
    pub const fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    /// Whether this state is `STATE_ENABLED`.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

wire_enum! {
    /// Pool load-balancing method
    pub enum LbMethod: "LB_METHOD_" {
        RoundRobin => "ROUND_ROBIN",
        RatioMember => "RATIO_MEMBER",
        LeastConnectionMember => "LEAST_CONNECTION_MEMBER",
        ObservedMember => "OBSERVED_MEMBER",
        PredictiveMember => "PREDICTIVE_MEMBER",
        RatioNodeAddress => "RATIO_NODE_ADDRESS",
        LeastConnectionNodeAddress => "LEAST_CONNECTION_NODE_ADDRESS",
        FastestNodeAddress => "FASTEST_NODE_ADDRESS",
        ObservedNodeAddress => "OBSERVED_NODE_ADDRESS",
        PredictiveNodeAddress => "PREDICTIVE_NODE_ADDRESS",
        DynamicRatio => "DYNAMIC_RATIO",
        FastestAppResponse => "FASTEST_APP_RESPONSE",
        LeastSessions => "LEAST_SESSIONS",
        DynamicRatioMember => "DYNAMIC_RATIO_MEMBER",
        L3Addr => "L3_ADDR",
        Unknown => "UNKNOWN",
        WeightedLeastConnectionMember => "WEIGHTED_LEAST_CONNECTION_MEMBER",
        WeightedLeastConnectionNodeAddress => "WEIGHTED_LEAST_CONNECTION_NODE_ADDRESS",
        RatioSession => "RATIO_SESSION",
        RatioLeastConnectionMember => "RATIO_LEAST_CONNECTION_MEMBER",
        RatioLeastConnectionNodeAddress => "RATIO_LEAST_CONNECTION_NODE_ADDRESS",
    }
}

impl Default for LbMethod {
    fn default() -> Self {
        Self::RoundRobin
    }
}

wire_enum! {
    /// How the monitors associated with a pool are combined
    pub enum MonitorRuleType: "MONITOR_RULE_TYPE_" {
        Unknown => "UNKNOWN",
        None => "NONE",
        Single => "SINGLE",
        AndList => "AND_LIST",
        MOfN => "M_OF_N",
    }
}

impl MonitorRuleType {
    /// Rule type for a set of `count` monitors: none, single, or all-must-pass.
    #[must_use]
    pub const fn for_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            1 => Self::Single,
            _ => Self::AndList,
        }
    }
}

wire_enum! {
    /// Virtual server IP protocol
    pub enum Protocol: "PROTOCOL_" {
        Any => "ANY",
        Ipv6 => "IPV6",
        Routing => "ROUTING",
        None => "NONE",
        Fragment => "FRAGMENT",
        Dstopts => "DSTOPTS",
        Tcp => "TCP",
        Udp => "UDP",
        Icmp => "ICMP",
        Icmpv6 => "ICMPV6",
        Ospf => "OSPF",
        Sctp => "SCTP",
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::Tcp
    }
}

wire_enum! {
    /// Virtual server resource type
    pub enum ResourceType: "RESOURCE_TYPE_" {
        Pool => "POOL",
        IpForwarding => "IP_FORWARDING",
        L2Forwarding => "L2_FORWARDING",
        Reject => "REJECT",
        FastL4 => "FAST_L4",
        FastHttp => "FAST_HTTP",
        Stateless => "STATELESS",
        DhcpRelay => "DHCP_RELAY",
        Internal => "INTERNAL",
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        Self::Pool
    }
}

wire_enum! {
    /// Side of the connection a profile applies to
    pub enum ProfileContext: "PROFILE_CONTEXT_TYPE_" {
        All => "ALL",
        Client => "CLIENT",
        Server => "SERVER",
    }
}

impl Default for ProfileContext {
    fn default() -> Self {
        Self::All
    }
}

wire_enum! {
    /// Source address translation mode of a virtual server
    pub enum SnatType: "SRC_TRANS_" {
        Unknown => "UNKNOWN",
        None => "NONE",
        Automap => "AUTOMAP",
        SnatPool => "SNATPOOL",
        Lsn => "LSN",
    }
}

impl Default for SnatType {
    fn default() -> Self {
        Self::None
    }
}

wire_enum! {
    /// Monitor template protocol type
    pub enum MonitorType: "TTYPE_" {
        Unset => "UNSET",
        Icmp => "ICMP",
        Tcp => "TCP",
        TcpEcho => "TCP_ECHO",
        External => "EXTERNAL",
        Http => "HTTP",
        Https => "HTTPS",
        Nntp => "NNTP",
        Ftp => "FTP",
        Pop3 => "POP3",
        Smtp => "SMTP",
        Mssql => "MSSQL",
        Gateway => "GATEWAY",
        Imap => "IMAP",
        Radius => "RADIUS",
        Ldap => "LDAP",
        Wmi => "WMI",
        SnmpDca => "SNMP_DCA",
        SnmpDcaBase => "SNMP_DCA_BASE",
        RealServer => "REAL_SERVER",
        Udp => "UDP",
        None => "NONE",
        Oracle => "ORACLE",
        Soap => "SOAP",
        GatewayIcmp => "GATEWAY_ICMP",
        Sip => "SIP",
        TcpHalfOpen => "TCP_HALF_OPEN",
        Scripted => "SCRIPTED",
        Wap => "WAP",
        Rpc => "RPC",
        Smb => "SMB",
        Sasp => "SASP",
        ModuleScore => "MODULE_SCORE",
        Firepass => "FIREPASS",
        Inband => "INBAND",
        RadiusAccounting => "RADIUS_ACCOUNTING",
        Diameter => "DIAMETER",
        VirtualLocation => "VIRTUAL_LOCATION",
        Mysql => "MYSQL",
        Postgresql => "POSTGRESQL",
        Sql => "SQL",
        Dns => "DNS",
    }
}

wire_enum! {
    /// Monitor destination address type
    pub enum AddressType: "ATYPE_" {
        Unset => "UNSET",
        StarAddressStarPort => "STAR_ADDRESS_STAR_PORT",
        StarAddressExplicitPort => "STAR_ADDRESS_EXPLICIT_PORT",
        ExplicitAddressExplicitPort => "EXPLICIT_ADDRESS_EXPLICIT_PORT",
        StarAddress => "STAR_ADDRESS",
        ExplicitAddress => "EXPLICIT_ADDRESS",
    }
}

impl Default for AddressType {
    fn default() -> Self {
        Self::StarAddressExplicitPort
    }
}

wire_enum! {
    /// Integer-valued monitor template properties
    pub enum IntegerPropertyType: "ITYPE_" {
        Unset => "UNSET",
        Interval => "INTERVAL",
        Timeout => "TIMEOUT",
        ProbeInterval => "PROBE_INTERVAL",
        ProbeTimeout => "PROBE_TIMEOUT",
        ProbeNumProbes => "PROBE_NUM_PROBES",
        ProbeNumSuccesses => "PROBE_NUM_SUCCESSES",
        TimeUntilUp => "TIME_UNTIL_UP",
        UpInterval => "UP_INTERVAL",
    }
}

wire_enum! {
    /// String-valued monitor template properties managed by ltmsync
    pub enum StringPropertyType: "STYPE_" {
        Send => "SEND",
        Receive => "RECEIVE",
        Username => "USERNAME",
        Password => "PASSWORD",
        QueryName => "QUERY_NAME",
        QueryType => "QUERY_TYPE",
        AnswerContains => "ANSWER_CONTAINS",
    }
}

impl StringPropertyType {
    /// Monitor types on which this property may be set.
    #[must_use]
    pub fn allowed_types(self) -> &'static [MonitorType] {
        use MonitorType as T;
        match self {
            Self::Send | Self::Receive => &[T::Http, T::Https, T::Tcp],
            Self::Username => &[
                T::Http,
                T::Https,
                T::Nntp,
                T::Ftp,
                T::Pop3,
                T::Sql,
                T::Imap,
                T::Radius,
                T::RadiusAccounting,
                T::Ldap,
                T::Wmi,
                T::Sip,
            ],
            Self::Password => &[
                T::Http,
                T::Https,
                T::Nntp,
                T::Ftp,
                T::Pop3,
                T::Sql,
                T::Imap,
                T::Radius,
                T::Ldap,
                T::Wmi,
                T::Sip,
            ],
            Self::QueryName | Self::QueryType | Self::AnswerContains => &[T::Dns],
        }
    }

    /// Whether this property may be set on a monitor of `monitor_type`.
    #[must_use]
    pub fn allowed_for(self, monitor_type: MonitorType) -> bool {
        self.allowed_types().contains(&monitor_type)
    }

    /// Every property that may be set on a monitor of `monitor_type`.
    #[must_use]
    pub fn applicable_to(monitor_type: MonitorType) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|property| property.allowed_for(monitor_type))
            .collect()
    }
}

wire_enum! {
    /// Key/certificate store a certificate operation targets
    pub enum ManagementMode: "MANAGEMENT_MODE_" {
        Default => "DEFAULT",
        Webserver => "WEBSERVER",
        Em => "EM",
        Iquery => "IQUERY",
        IqueryBig3d => "IQUERY_BIG3D",
    }
}

impl Default for ManagementMode {
    fn default() -> Self {
        Self::Default
    }
}

wire_enum! {
    /// High-availability failover state of a device
    pub enum FailoverState: "FAILOVER_STATE_" {
        Offline => "OFFLINE",
        ForcedOffline => "FORCED_OFFLINE",
        Standby => "STANDBY",
        Active => "ACTIVE",
    }
}

/// Enabled status reported for disabled objects
pub const ENABLED_STATUS_DISABLED: &str = "ENABLED_STATUS_DISABLED";

/// Availability and enabled status of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStatus {
    pub availability_status: String,
    pub enabled_status: String,
    #[serde(default)]
    pub status_description: String,
}

impl ObjectStatus {
    /// Anything other than an explicit disable counts as enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled_status != ENABLED_STATUS_DISABLED
    }
}

/// Address and port of a pool member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberAddress {
    pub address: String,
    pub port: u16,
}

/// Monitor rule attached to a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRule {
    #[serde(rename = "type")]
    pub rule_type: MonitorRuleType,
    pub quorum: u32,
    pub monitor_templates: Vec<String>,
}

impl Default for MonitorRule {
    fn default() -> Self {
        Self {
            rule_type: MonitorRuleType::None,
            quorum: 0,
            monitor_templates: Vec::new(),
        }
    }
}

/// A pool and the monitor rule associated with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorAssociation {
    pub pool_name: String,
    pub monitor_rule: MonitorRule,
}

/// Address/port pair used by destinations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpPort {
    pub address: String,
    pub port: u16,
}

/// Identity of a virtual server submitted at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualServerDefinition {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub protocol: Protocol,
}

/// Resource type and default pool submitted at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualServerResource {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub default_pool_name: String,
}

/// A profile bound to a virtual server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileAttribute {
    #[serde(default)]
    pub profile_context: ProfileContext,
    pub profile_name: String,
}

/// VLAN filter of a virtual server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanFilter {
    pub state: EnabledState,
    pub vlans: Vec<String>,
}

/// A persistence profile bound to a virtual server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceProfile {
    pub profile_name: String,
    pub default_profile: bool,
}

/// An iRule bound to a virtual server; lower priority runs first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAssignment {
    pub rule_name: String,
    pub priority: u32,
}

/// Monitor template identity; a `None` type is inferred from the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTemplate {
    pub template_name: String,
    pub template_type: Option<MonitorType>,
}

/// Monitor destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorIpPort {
    pub address_type: AddressType,
    pub ipport: IpPort,
}

/// Attributes submitted together with a new monitor template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonAttributes {
    pub parent_template: String,
    pub interval: u32,
    pub timeout: u32,
    pub description: String,
    pub dest_ipport: MonitorIpPort,
    pub is_read_only: bool,
    pub is_directly_usable: bool,
}

/// Integer monitor property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerProperty {
    #[serde(rename = "type")]
    pub property_type: IntegerPropertyType,
    pub value: u32,
}

/// String monitor property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringProperty {
    #[serde(rename = "type")]
    pub property_type: StringPropertyType,
    pub value: String,
}

/// Member of an address class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressEntry {
    pub address: String,
    pub netmask: String,
}

/// Address data class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressClass {
    pub name: String,
    pub members: Vec<AddressEntry>,
}

/// String data class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringClass {
    pub name: String,
    pub members: Vec<String>,
}

/// iRule name and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub rule_name: String,
    pub rule_definition: String,
}
