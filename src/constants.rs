// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for ltmsync.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Management API Interfaces
// ============================================================================

/// Interface name for node addresses
pub const IFACE_NODE: &str = "LocalLB.NodeAddressV2";

/// Interface name for pools
pub const IFACE_POOL: &str = "LocalLB.Pool";

/// Interface name for virtual servers
pub const IFACE_VIRTUAL_SERVER: &str = "LocalLB.VirtualServer";

/// Interface name for monitor templates
pub const IFACE_MONITOR: &str = "LocalLB.Monitor";

/// Interface name for data classes
pub const IFACE_CLASS: &str = "LocalLB.Class";

/// Interface name for iRules
pub const IFACE_RULE: &str = "LocalLB.Rule";

/// Interface name for SSL certificates and keys
pub const IFACE_KEY_CERTIFICATE: &str = "Management.KeyCertificate";

/// Interface name for config-sync
pub const IFACE_CONFIG_SYNC: &str = "System.ConfigSync";

/// Interface name for the session (active folder)
pub const IFACE_SESSION: &str = "System.Session";

/// Interface name for partitions
pub const IFACE_PARTITION: &str = "Management.Partition";

/// Interface name for failover state
pub const IFACE_FAILOVER: &str = "System.Failover";

/// Interface name for device groups
pub const IFACE_DEVICE_GROUP: &str = "Management.DeviceGroup";

/// Interface name for system network identity
pub const IFACE_INET: &str = "System.Inet";

/// URL path prefix under which every interface is served
pub const RPC_PATH_PREFIX: &str = "iControl";

// ============================================================================
// Folder Constants
// ============================================================================

/// Folder every device starts in and that bare names default to
pub const DEFAULT_FOLDER: &str = "Common";

/// Device groups containing this marker are trust groups, not sync targets
pub const DEVICE_TRUST_GROUP_MARKER: &str = "device_trust_group";

/// GTM sync group, never a target for LTM config-sync
pub const GTM_DEVICE_GROUP: &str = "/Common/gtm";

// ============================================================================
// Resource Defaults
// ============================================================================

/// Default description applied to nodes
pub const DEFAULT_NODE_DESCRIPTION: &str = "Managed by ltmsync";

/// Default monitor parent template
pub const DEFAULT_MONITOR_PARENT: &str = "https";

/// Default monitor interval in seconds
pub const DEFAULT_MONITOR_INTERVAL_SECS: u32 = 5;

/// Default monitor timeout in seconds
pub const DEFAULT_MONITOR_TIMEOUT_SECS: u32 = 16;

/// Default monitor destination address (any)
pub const DEFAULT_MONITOR_DEST_IP: &str = "0.0.0.0";

/// Default monitor destination port
pub const DEFAULT_MONITOR_DEST_PORT: u16 = 443;

/// Default virtual server destination wildmask (host)
pub const DEFAULT_WILDMASK: &str = "255.255.255.255";

/// Default virtual server source address filter (any)
pub const DEFAULT_SOURCE_ADDRESS: &str = "0.0.0.0/0";

/// Default virtual server profile
pub const DEFAULT_VIRTUAL_SERVER_PROFILE: &str = "/Common/tcp";

/// Default destination and member port of a composite service declaration
pub const DEFAULT_SERVICE_PORT: u16 = 443;

/// Netmask applied to address class entries declared without one
pub const HOST_NETMASK: &str = "255.255.255.255";

/// Quorum sent with monitor associations
pub const MONITOR_RULE_QUORUM: u32 = 0;

// ============================================================================
// Connection Defaults
// ============================================================================

/// Default URL scheme for the management API
pub const DEFAULT_SCHEME: &str = "https";

/// Default management API port
pub const DEFAULT_API_PORT: u16 = 443;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the default username
pub const ENV_USERNAME: &str = "LTMSYNC_USERNAME";

/// Environment variable overriding the default password
pub const ENV_PASSWORD: &str = "LTMSYNC_PASSWORD";

// ============================================================================
// Metrics
// ============================================================================

/// Namespace prefix for all metrics
pub const METRICS_NAMESPACE: &str = "ltmsync";
