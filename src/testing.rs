// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory load balancer for unit tests.
//!
//! [`FakeDevice`] implements every service trait against plain vectors,
//! records each call it receives, and mimics the device behaviour reconcilers
//! depend on: bare names resolve against the active folder, nodes referenced
//! by a pool cannot be deleted, monitor types are inferred from the parent
//! template, rules with empty content are missing from `query`, and creating
//! an object that already exists fails.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::collections::{Monitor, Node, Pool, VirtualServer};
use crate::device::LoadBalancer;
use crate::errors::RemoteError;
use crate::icontrol::services::{
    ClassService, ConfigSyncService, DeviceGroupService, FailoverService, InetService,
    KeyCertificateService, MonitorService, NodeService, PoolService, RemoteResult, RuleService,
    SessionService, VirtualServerService,
};
use crate::icontrol::types::{
    AddressClass, AddressEntry, AddressType, CommonAttributes, EnabledState, FailoverState,
    IntegerProperty, IntegerPropertyType, IpPort, LbMethod, ManagementMode, MemberAddress,
    MonitorAssociation, MonitorIpPort, MonitorRule, MonitorRuleType, MonitorTemplate, MonitorType,
    ObjectStatus, PersistenceProfile, ProfileAttribute, ProfileContext, Protocol, ResourceType,
    RuleAssignment, RuleDefinition, SnatType, StringClass, StringProperty, StringPropertyType,
    VirtualServerDefinition, VirtualServerResource, VlanFilter, ENABLED_STATUS_DISABLED,
};
use crate::icontrol::Remote;
use crate::names::{folder_of, qualify, same_object};

pub(crate) const FAKE_HOST: &str = "lb1.example.com";

/// One call received by the fake.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    /// `family.method`, e.g. `pool.add_members`
    pub method: String,
    pub detail: Value,
    pub mutating: bool,
}

#[derive(Debug)]
struct FakeState {
    active_folder: String,
    partitions: Vec<String>,
    nodes: Vec<Node>,
    pools: Vec<Pool>,
    virtual_servers: Vec<VirtualServer>,
    rule_assignments: BTreeMap<String, Vec<RuleAssignment>>,
    root_monitors: Vec<MonitorTemplate>,
    monitors: Vec<Monitor>,
    address_classes: Vec<(AddressClass, Vec<String>)>,
    string_classes: Vec<(StringClass, Vec<String>)>,
    rules: Vec<RuleDefinition>,
    certificates: BTreeMap<String, String>,
    keys: BTreeMap<String, String>,
    failover_state: FailoverState,
    device_groups: Vec<String>,
    hostname: String,
    syncs: Vec<(String, String)>,
    calls: Vec<RecordedCall>,
    failing: HashSet<String>,
    truncated: HashSet<String>,
}

fn device_error(method: &'static str, message: impl Into<String>) -> RemoteError {
    RemoteError::CallFailed {
        interface: "fake",
        method,
        host: FAKE_HOST.to_string(),
        status: 500,
        message: message.into(),
    }
}

fn root_template(name: &str, template_type: MonitorType) -> MonitorTemplate {
    MonitorTemplate {
        template_name: qualify(name, "Common"),
        template_type: Some(template_type),
    }
}

fn status_for(enabled: bool) -> ObjectStatus {
    ObjectStatus {
        availability_status: "AVAILABILITY_STATUS_BLUE".to_string(),
        enabled_status: if enabled {
            "ENABLED_STATUS_ENABLED".to_string()
        } else {
            ENABLED_STATUS_DISABLED.to_string()
        },
        status_description: String::new(),
    }
}

impl FakeState {
    fn new() -> Self {
        Self {
            active_folder: "Common".to_string(),
            partitions: vec!["Common".to_string()],
            nodes: Vec::new(),
            pools: Vec::new(),
            virtual_servers: Vec::new(),
            rule_assignments: BTreeMap::new(),
            root_monitors: vec![
                root_template("http", MonitorType::Http),
                root_template("https", MonitorType::Https),
                root_template("tcp", MonitorType::Tcp),
                root_template("gateway_icmp", MonitorType::GatewayIcmp),
                root_template("dns", MonitorType::Dns),
                root_template("ftp", MonitorType::Ftp),
                root_template("radius_accounting", MonitorType::RadiusAccounting),
            ],
            monitors: Vec::new(),
            address_classes: Vec::new(),
            string_classes: Vec::new(),
            rules: Vec::new(),
            certificates: BTreeMap::new(),
            keys: BTreeMap::new(),
            failover_state: FailoverState::Active,
            device_groups: Vec::new(),
            hostname: FAKE_HOST.to_string(),
            syncs: Vec::new(),
            calls: Vec::new(),
            failing: HashSet::new(),
            truncated: HashSet::new(),
        }
    }

    fn qualify(&self, name: &str) -> String {
        qualify(name, &self.active_folder)
    }

    fn qualify_optional(&self, name: &str) -> String {
        if name.is_empty() {
            String::new()
        } else {
            self.qualify(name)
        }
    }

    fn visible(&self, name: &str) -> bool {
        folder_of(name) == Some(self.active_folder.as_str())
    }

    fn record(&mut self, method: &'static str, detail: Value, mutating: bool) -> RemoteResult<()> {
        self.calls.push(RecordedCall {
            method: method.to_string(),
            detail,
            mutating,
        });
        if self.failing.contains(method) {
            return Err(device_error(method, "injected failure"));
        }
        Ok(())
    }

    fn finish<T>(&self, method: &'static str, mut values: Vec<T>) -> Vec<T> {
        if self.truncated.contains(method) {
            values.pop();
        }
        values
    }

    fn node(&self, name: &str, method: &'static str) -> RemoteResult<&Node> {
        let name = self.qualify(name);
        self.nodes
            .iter()
            .find(|node| node.name == name)
            .ok_or_else(|| device_error(method, format!("node {name} was not found")))
    }

    fn node_mut(&mut self, name: &str, method: &'static str) -> RemoteResult<&mut Node> {
        let name = self.qualify(name);
        self.nodes
            .iter_mut()
            .find(|node| node.name == name)
            .ok_or_else(|| device_error(method, format!("node {name} was not found")))
    }

    fn pool(&self, name: &str, method: &'static str) -> RemoteResult<&Pool> {
        let name = self.qualify(name);
        self.pools
            .iter()
            .find(|pool| pool.name == name)
            .ok_or_else(|| device_error(method, format!("pool {name} was not found")))
    }

    fn pool_mut(&mut self, name: &str, method: &'static str) -> RemoteResult<&mut Pool> {
        let name = self.qualify(name);
        self.pools
            .iter_mut()
            .find(|pool| pool.name == name)
            .ok_or_else(|| device_error(method, format!("pool {name} was not found")))
    }

    fn server(&self, name: &str, method: &'static str) -> RemoteResult<&VirtualServer> {
        let name = self.qualify(name);
        self.virtual_servers
            .iter()
            .find(|vs| vs.name == name)
            .ok_or_else(|| device_error(method, format!("virtual server {name} was not found")))
    }

    fn server_mut(&mut self, name: &str, method: &'static str) -> RemoteResult<&mut VirtualServer> {
        let name = self.qualify(name);
        self.virtual_servers
            .iter_mut()
            .find(|vs| vs.name == name)
            .ok_or_else(|| device_error(method, format!("virtual server {name} was not found")))
    }

    fn monitor(&self, name: &str, method: &'static str) -> RemoteResult<&Monitor> {
        let name = self.qualify(name);
        self.monitors
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| device_error(method, format!("monitor {name} was not found")))
    }

    fn monitor_mut(&mut self, name: &str, method: &'static str) -> RemoteResult<&mut Monitor> {
        let name = self.qualify(name);
        self.monitors
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| device_error(method, format!("monitor {name} was not found")))
    }

    /// Type and resolved name of a parent template, root or user-defined.
    fn parent_type(&self, parent: &str) -> Option<(String, MonitorType)> {
        if let Some(root) = self
            .root_monitors
            .iter()
            .find(|root| match folder_of(parent) {
                Some(_) => root.template_name == parent,
                None => same_object(&root.template_name, parent),
            })
        {
            return Some((
                root.template_name.clone(),
                root.template_type.unwrap_or(MonitorType::Unset),
            ));
        }
        let qualified = self.qualify(parent);
        self.monitors
            .iter()
            .find(|m| m.name == qualified)
            .map(|m| (m.name.clone(), m.monitor_type))
    }
}

/// In-memory device implementing every service family.
#[derive(Debug)]
pub(crate) struct FakeDevice {
    state: Mutex<FakeState>,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// A virtual server as the device creates it, before any attribute is changed.
pub(crate) fn virtual_server(name: &str, address: &str, port: u16) -> VirtualServer {
    VirtualServer {
        name: qualify(name, "Common"),
        destination: IpPort {
            address: qualify(address, "Common"),
            port,
        },
        wildmask: "255.255.255.255".to_string(),
        resource_type: ResourceType::Pool,
        protocol: Protocol::Tcp,
        default_pool: String::new(),
        enabled: true,
        description: String::new(),
        source_address: "0.0.0.0/0".to_string(),
        translate_address: EnabledState::Disabled,
        translate_port: EnabledState::Disabled,
        profiles: vec![ProfileAttribute {
            profile_context: ProfileContext::All,
            profile_name: "/Common/tcp".to_string(),
        }],
        vlans: VlanFilter {
            state: EnabledState::Disabled,
            vlans: Vec::new(),
        },
        snat_type: SnatType::None,
        snat_pool: String::new(),
        persistence: Vec::new(),
        fallback_persistence: String::new(),
        rules: Vec::new(),
    }
}

/// A monitor as the device creates it from a root parent with default attributes.
pub(crate) fn monitor(name: &str, parent: &str, monitor_type: MonitorType) -> Monitor {
    Monitor {
        name: qualify(name, "Common"),
        monitor_type,
        parent: qualify(parent, "Common"),
        interval: 5,
        timeout: 16,
        description: String::new(),
        destination: MonitorIpPort {
            address_type: AddressType::StarAddressExplicitPort,
            ipport: IpPort {
                address: "0.0.0.0".to_string(),
                port: 443,
            },
        },
        user_values: BTreeMap::new(),
    }
}

impl FakeDevice {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn edit(mut self, change: impl FnOnce(&mut FakeState)) -> Self {
        change(self.state.get_mut().unwrap());
        self
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    pub(crate) fn with_partition(self, folder: &str) -> Self {
        self.edit(|s| s.partitions.push(folder.to_string()))
    }

    pub(crate) fn with_node(self, name: &str, address: &str, enabled: bool) -> Self {
        self.edit(|s| {
            let name = s.qualify(name);
            let partition = folder_of(&name).unwrap_or("Common").to_string();
            s.nodes.push(Node {
                name,
                address: address.to_string(),
                enabled,
                description: String::new(),
                partition,
            });
        })
    }

    pub(crate) fn with_node_description(self, name: &str, description: &str) -> Self {
        self.edit(|s| {
            let name = s.qualify(name);
            if let Some(node) = s.nodes.iter_mut().find(|n| n.name == name) {
                node.description = description.to_string();
            }
        })
    }

    pub(crate) fn with_pool(self, name: &str, members: &[(&str, u16)], monitors: &[&str]) -> Self {
        self.edit(|s| {
            let pool = Pool {
                name: s.qualify(name),
                lb_method: LbMethod::RoundRobin,
                members: members
                    .iter()
                    .map(|(address, port)| MemberAddress {
                        address: s.qualify(address),
                        port: *port,
                    })
                    .collect(),
                monitors: monitors.iter().map(|m| s.qualify(m)).collect(),
                description: String::new(),
            };
            s.pools.push(pool);
        })
    }

    pub(crate) fn with_virtual_server(self, server: VirtualServer) -> Self {
        self.edit(|s| {
            let assignments = server
                .rules
                .iter()
                .zip(1..)
                .map(|(rule, priority)| RuleAssignment {
                    rule_name: rule.clone(),
                    priority,
                })
                .collect();
            s.rule_assignments.insert(server.name.clone(), assignments);
            s.virtual_servers.push(VirtualServer {
                rules: Vec::new(),
                ..server
            });
        })
    }

    pub(crate) fn with_rule_assignments(self, server: &str, rules: &[(&str, u32)]) -> Self {
        self.edit(|s| {
            let assignments = rules
                .iter()
                .map(|(rule, priority)| RuleAssignment {
                    rule_name: rule.to_string(),
                    priority: *priority,
                })
                .collect();
            let server = s.qualify(server);
            s.rule_assignments.insert(server, assignments);
        })
    }

    pub(crate) fn with_monitor(self, monitor: Monitor) -> Self {
        self.edit(|s| s.monitors.push(monitor))
    }

    pub(crate) fn with_root_monitor(self, name: &str, monitor_type: MonitorType) -> Self {
        self.edit(|s| s.root_monitors.push(root_template(name, monitor_type)))
    }

    pub(crate) fn with_address_class(self, name: &str, entries: &[(&str, &str, &str)]) -> Self {
        self.edit(|s| {
            let class = AddressClass {
                name: s.qualify(name),
                members: entries
                    .iter()
                    .map(|(address, netmask, _)| AddressEntry {
                        address: address.to_string(),
                        netmask: netmask.to_string(),
                    })
                    .collect(),
            };
            let values = entries.iter().map(|(_, _, value)| value.to_string()).collect();
            s.address_classes.push((class, values));
        })
    }

    pub(crate) fn with_string_class(self, name: &str, entries: &[(&str, &str)]) -> Self {
        self.edit(|s| {
            let class = StringClass {
                name: s.qualify(name),
                members: entries.iter().map(|(key, _)| key.to_string()).collect(),
            };
            let values = entries.iter().map(|(_, value)| value.to_string()).collect();
            s.string_classes.push((class, values));
        })
    }

    pub(crate) fn with_rule(self, name: &str, content: &str) -> Self {
        self.edit(|s| {
            let rule = RuleDefinition {
                rule_name: s.qualify(name),
                rule_definition: content.to_string(),
            };
            s.rules.push(rule);
        })
    }

    pub(crate) fn with_certificate(self, id: &str, pem: &str) -> Self {
        self.edit(|s| {
            let id = s.qualify(id);
            s.certificates.insert(id, pem.to_string());
        })
    }

    pub(crate) fn with_key(self, id: &str, pem: &str) -> Self {
        self.edit(|s| {
            let id = s.qualify(id);
            s.keys.insert(id, pem.to_string());
        })
    }

    pub(crate) fn with_failover_state(self, state: FailoverState) -> Self {
        self.edit(|s| s.failover_state = state)
    }

    pub(crate) fn with_device_groups(self, groups: &[&str]) -> Self {
        self.edit(|s| s.device_groups = groups.iter().map(|g| g.to_string()).collect())
    }

    pub(crate) fn with_hostname(self, hostname: &str) -> Self {
        self.edit(|s| s.hostname = hostname.to_string())
    }

    /// Make every call to `method` fail after being recorded.
    pub(crate) fn failing(self, method: &str) -> Self {
        self.edit(|s| {
            s.failing.insert(method.to_string());
        })
    }

    /// Drop the last entry of every result returned by `method`.
    pub(crate) fn truncating(self, method: &str) -> Self {
        self.edit(|s| {
            s.truncated.insert(method.to_string());
        })
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub(crate) fn call_names(&self) -> Vec<String> {
        self.state().calls.iter().map(|c| c.method.clone()).collect()
    }

    pub(crate) fn mutations(&self) -> Vec<RecordedCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.mutating)
            .cloned()
            .collect()
    }

    pub(crate) fn mutation_names(&self) -> Vec<String> {
        self.mutations().into_iter().map(|c| c.method).collect()
    }

    /// First recorded call to `method`.
    pub(crate) fn call(&self, method: &str) -> Option<RecordedCall> {
        self.state().calls.iter().find(|c| c.method == method).cloned()
    }

    pub(crate) fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub(crate) fn active_folder(&self) -> String {
        self.state().active_folder.clone()
    }

    pub(crate) fn node(&self, name: &str) -> Option<Node> {
        let state = self.state();
        state.node(name, "inspect").ok().cloned()
    }

    pub(crate) fn pool(&self, name: &str) -> Option<Pool> {
        let state = self.state();
        state.pool(name, "inspect").ok().cloned()
    }

    /// Virtual server with its rules in priority order.
    pub(crate) fn virtual_server(&self, name: &str) -> Option<VirtualServer> {
        let state = self.state();
        let mut server = state.server(name, "inspect").ok().cloned()?;
        let mut assignments = state
            .rule_assignments
            .get(&server.name)
            .cloned()
            .unwrap_or_default();
        assignments.sort_by_key(|a| a.priority);
        server.rules = assignments.into_iter().map(|a| a.rule_name).collect();
        Some(server)
    }

    pub(crate) fn rule_assignments(&self, server: &str) -> Vec<RuleAssignment> {
        let state = self.state();
        let server = state.qualify(server);
        state
            .rule_assignments
            .get(&server)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn monitor(&self, name: &str) -> Option<Monitor> {
        let state = self.state();
        state.monitor(name, "inspect").ok().cloned()
    }

    pub(crate) fn address_class(&self, name: &str) -> Option<(AddressClass, Vec<String>)> {
        let state = self.state();
        let name = state.qualify(name);
        state
            .address_classes
            .iter()
            .find(|(class, _)| class.name == name)
            .cloned()
    }

    pub(crate) fn string_class(&self, name: &str) -> Option<(StringClass, Vec<String>)> {
        let state = self.state();
        let name = state.qualify(name);
        state
            .string_classes
            .iter()
            .find(|(class, _)| class.name == name)
            .cloned()
    }

    pub(crate) fn rule(&self, name: &str) -> Option<String> {
        let state = self.state();
        let name = state.qualify(name);
        state
            .rules
            .iter()
            .find(|r| r.rule_name == name)
            .map(|r| r.rule_definition.clone())
    }

    pub(crate) fn certificate(&self, id: &str) -> Option<String> {
        let state = self.state();
        state.certificates.get(&state.qualify(id)).cloned()
    }

    pub(crate) fn key(&self, id: &str) -> Option<String> {
        let state = self.state();
        state.keys.get(&state.qualify(id)).cloned()
    }

    pub(crate) fn syncs(&self) -> Vec<(String, String)> {
        self.state().syncs.clone()
    }
}

/// Connect a [`LoadBalancer`] to `fake`, then forget the connection calls.
pub(crate) async fn connect(fake: &Arc<FakeDevice>) -> LoadBalancer {
    let device = LoadBalancer::connect(FAKE_HOST, Remote::from_client(Arc::clone(fake)))
        .await
        .unwrap();
    fake.clear_calls();
    device
}

// ============================================================================
// Nodes
// ============================================================================

#[async_trait]
impl NodeService for FakeDevice {
    async fn create(
        &self,
        names: &[String],
        addresses: &[String],
        connection_limits: &[u32],
    ) -> RemoteResult<()> {
        const M: &str = "node.create";
        let mut s = self.state();
        s.record(
            M,
            json!({"names": names, "addresses": addresses, "limits": connection_limits}),
            true,
        )?;
        for (name, address) in names.iter().zip(addresses) {
            let name = s.qualify(name);
            if s.nodes.iter().any(|n| n.name == name) {
                return Err(device_error(M, format!("node {name} already exists")));
            }
            let partition = folder_of(&name).unwrap_or("Common").to_string();
            s.nodes.push(Node {
                name,
                address: address.clone(),
                enabled: true,
                description: String::new(),
                partition,
            });
        }
        Ok(())
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "node.delete";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let node = s.node(name, M)?.clone();
            if let Some(pool) = s.pools.iter().find(|p| p.has_member_address(&node.address)) {
                return Err(device_error(
                    M,
                    format!("node {} is referenced by pool {}", node.name, pool.name),
                ));
            }
            s.nodes.retain(|n| n.name != node.name);
        }
        Ok(())
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("node.list", Value::Null, false)?;
        Ok(s.nodes
            .iter()
            .filter(|n| s.visible(&n.name))
            .map(|n| n.name.clone())
            .collect())
    }

    async fn get_address(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        const M: &str = "node.get_address";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.node(n, M).map(|node| node.address.clone()))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn get_object_status(&self, names: &[String]) -> RemoteResult<Vec<ObjectStatus>> {
        const M: &str = "node.get_object_status";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.node(n, M).map(|node| status_for(node.enabled)))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        const M: &str = "node.get_description";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.node(n, M).map(|node| node.description.clone()))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_enabled_state(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        const M: &str = "node.set_enabled_state";
        let mut s = self.state();
        s.record(M, json!({"names": names, "states": states}), true)?;
        for (name, state) in names.iter().zip(states) {
            s.node_mut(name, M)?.enabled = state.is_enabled();
        }
        Ok(())
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        const M: &str = "node.set_description";
        let mut s = self.state();
        s.record(M, json!({"names": names, "descriptions": descriptions}), true)?;
        for (name, description) in names.iter().zip(descriptions) {
            s.node_mut(name, M)?.description = description.clone();
        }
        Ok(())
    }
}

// ============================================================================
// Pools
// ============================================================================

#[async_trait]
impl PoolService for FakeDevice {
    async fn create(
        &self,
        names: &[String],
        lb_methods: &[LbMethod],
        members: &[Vec<MemberAddress>],
    ) -> RemoteResult<()> {
        const M: &str = "pool.create";
        let mut s = self.state();
        s.record(
            M,
            json!({"names": names, "lb_methods": lb_methods, "members": members}),
            true,
        )?;
        for ((name, method), members) in names.iter().zip(lb_methods).zip(members) {
            let name = s.qualify(name);
            if s.pools.iter().any(|p| p.name == name) {
                return Err(device_error(M, format!("pool {name} already exists")));
            }
            let members = members
                .iter()
                .map(|m| MemberAddress {
                    address: s.qualify(&m.address),
                    port: m.port,
                })
                .collect();
            s.pools.push(Pool {
                name,
                lb_method: *method,
                members,
                monitors: Vec::new(),
                description: String::new(),
            });
        }
        Ok(())
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "pool.delete";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let name = s.pool(name, M)?.name.clone();
            s.pools.retain(|p| p.name != name);
        }
        Ok(())
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("pool.list", Value::Null, false)?;
        Ok(s.pools
            .iter()
            .filter(|p| s.visible(&p.name))
            .map(|p| p.name.clone())
            .collect())
    }

    async fn get_members(&self, names: &[String]) -> RemoteResult<Vec<Vec<MemberAddress>>> {
        const M: &str = "pool.get_members";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.pool(n, M).map(|pool| pool.members.clone()))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn add_members(&self, names: &[String], members: &[Vec<MemberAddress>]) -> RemoteResult<()> {
        const M: &str = "pool.add_members";
        let mut s = self.state();
        s.record(M, json!({"names": names, "members": members}), true)?;
        for (name, members) in names.iter().zip(members) {
            let members: Vec<MemberAddress> = members
                .iter()
                .map(|m| MemberAddress {
                    address: s.qualify(&m.address),
                    port: m.port,
                })
                .collect();
            let pool = s.pool_mut(name, M)?;
            for member in members {
                if pool.members.contains(&member) {
                    return Err(device_error(M, "member already exists"));
                }
                pool.members.push(member);
            }
        }
        Ok(())
    }

    async fn remove_members(
        &self,
        names: &[String],
        members: &[Vec<MemberAddress>],
    ) -> RemoteResult<()> {
        const M: &str = "pool.remove_members";
        let mut s = self.state();
        s.record(M, json!({"names": names, "members": members}), true)?;
        for (name, members) in names.iter().zip(members) {
            let pool = s.pool_mut(name, M)?;
            for member in members {
                let before = pool.members.len();
                pool.members.retain(|m| {
                    !(same_object(&m.address, &member.address) && m.port == member.port)
                });
                if pool.members.len() == before {
                    return Err(device_error(M, "member was not found"));
                }
            }
        }
        Ok(())
    }

    async fn get_lb_method(&self, names: &[String]) -> RemoteResult<Vec<LbMethod>> {
        const M: &str = "pool.get_lb_method";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.pool(n, M).map(|pool| pool.lb_method))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_lb_method(&self, names: &[String], methods: &[LbMethod]) -> RemoteResult<()> {
        const M: &str = "pool.set_lb_method";
        let mut s = self.state();
        s.record(M, json!({"names": names, "methods": methods}), true)?;
        for (name, method) in names.iter().zip(methods) {
            s.pool_mut(name, M)?.lb_method = *method;
        }
        Ok(())
    }

    async fn get_monitor_association(
        &self,
        names: &[String],
    ) -> RemoteResult<Vec<MonitorAssociation>> {
        const M: &str = "pool.get_monitor_association";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| {
                s.pool(n, M).map(|pool| MonitorAssociation {
                    pool_name: pool.name.clone(),
                    monitor_rule: MonitorRule {
                        rule_type: MonitorRuleType::for_count(pool.monitors.len()),
                        quorum: 0,
                        monitor_templates: pool.monitors.clone(),
                    },
                })
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_monitor_association(
        &self,
        associations: &[MonitorAssociation],
    ) -> RemoteResult<()> {
        const M: &str = "pool.set_monitor_association";
        let mut s = self.state();
        s.record(M, json!({"associations": associations}), true)?;
        for association in associations {
            let templates: Vec<String> = association
                .monitor_rule
                .monitor_templates
                .iter()
                .map(|m| s.qualify(m))
                .collect();
            s.pool_mut(&association.pool_name, M)?.monitors = templates;
        }
        Ok(())
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        const M: &str = "pool.get_description";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.pool(n, M).map(|pool| pool.description.clone()))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        const M: &str = "pool.set_description";
        let mut s = self.state();
        s.record(M, json!({"names": names, "descriptions": descriptions}), true)?;
        for (name, description) in names.iter().zip(descriptions) {
            s.pool_mut(name, M)?.description = description.clone();
        }
        Ok(())
    }
}

// ============================================================================
// Virtual servers
// ============================================================================

/// Bulk getter over virtual servers.
macro_rules! vs_getter {
    ($self:ident, $names:ident, $method:literal, |$vs:ident| $value:expr) => {{
        const M: &str = $method;
        let mut s = $self.state();
        s.record(M, json!({ "names": $names }), false)?;
        let values = $names
            .iter()
            .map(|n| s.server(n, M).map(|$vs| $value))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }};
}

/// Bulk setter over virtual servers, one value per name.
macro_rules! vs_setter {
    ($self:ident, $names:ident, $values:ident, $method:literal, |$vs:ident, $value:ident| $apply:expr) => {{
        const M: &str = $method;
        let mut s = $self.state();
        s.record(M, json!({ "names": $names, "values": $values }), true)?;
        for (name, $value) in $names.iter().zip($values) {
            let $vs = s.server_mut(name, M)?;
            $apply;
        }
        Ok(())
    }};
}

#[async_trait]
impl VirtualServerService for FakeDevice {
    async fn create(
        &self,
        definitions: &[VirtualServerDefinition],
        wildmasks: &[String],
        resources: &[VirtualServerResource],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()> {
        const M: &str = "virtual_server.create";
        let mut s = self.state();
        s.record(
            M,
            json!({
                "definitions": definitions,
                "wildmasks": wildmasks,
                "resources": resources,
                "profiles": profiles,
            }),
            true,
        )?;
        for (((definition, wildmask), resource), profiles) in
            definitions.iter().zip(wildmasks).zip(resources).zip(profiles)
        {
            let name = s.qualify(&definition.name);
            if s.virtual_servers.iter().any(|vs| vs.name == name) {
                return Err(device_error(M, format!("virtual server {name} already exists")));
            }
            let folder = s.active_folder.clone();
            let mut server = virtual_server(&name, &definition.address, definition.port);
            server.destination.address = qualify(&definition.address, &folder);
            server.wildmask = wildmask.clone();
            server.protocol = definition.protocol;
            server.resource_type = resource.resource_type;
            server.translate_address = EnabledState::Enabled;
            server.translate_port = EnabledState::Enabled;
            server.default_pool = s.qualify_optional(&resource.default_pool_name);
            server.profiles = profiles
                .iter()
                .map(|p| ProfileAttribute {
                    profile_context: p.profile_context,
                    profile_name: s.qualify(&p.profile_name),
                })
                .collect();
            s.rule_assignments.insert(name, Vec::new());
            s.virtual_servers.push(server);
        }
        Ok(())
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "virtual_server.delete";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let name = s.server(name, M)?.name.clone();
            s.virtual_servers.retain(|vs| vs.name != name);
            s.rule_assignments.remove(&name);
        }
        Ok(())
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("virtual_server.list", Value::Null, false)?;
        Ok(s.virtual_servers
            .iter()
            .filter(|vs| s.visible(&vs.name))
            .map(|vs| vs.name.clone())
            .collect())
    }

    async fn get_destination(&self, names: &[String]) -> RemoteResult<Vec<IpPort>> {
        vs_getter!(self, names, "virtual_server.get_destination", |vs| vs.destination.clone())
    }

    async fn set_destination(&self, names: &[String], destinations: &[IpPort]) -> RemoteResult<()> {
        const M: &str = "virtual_server.set_destination";
        let mut s = self.state();
        s.record(M, json!({"names": names, "destinations": destinations}), true)?;
        for (name, destination) in names.iter().zip(destinations) {
            let address = s.qualify(&destination.address);
            s.server_mut(name, M)?.destination = IpPort {
                address,
                port: destination.port,
            };
        }
        Ok(())
    }

    async fn get_wildmask(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        vs_getter!(self, names, "virtual_server.get_wildmask", |vs| vs.wildmask.clone())
    }

    async fn set_wildmask(&self, names: &[String], wildmasks: &[String]) -> RemoteResult<()> {
        vs_setter!(self, names, wildmasks, "virtual_server.set_wildmask", |vs, value| {
            vs.wildmask = value.clone()
        })
    }

    async fn get_type(&self, names: &[String]) -> RemoteResult<Vec<ResourceType>> {
        vs_getter!(self, names, "virtual_server.get_type", |vs| vs.resource_type)
    }

    async fn get_protocol(&self, names: &[String]) -> RemoteResult<Vec<Protocol>> {
        vs_getter!(self, names, "virtual_server.get_protocol", |vs| vs.protocol)
    }

    async fn get_default_pool(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        vs_getter!(self, names, "virtual_server.get_default_pool", |vs| vs
            .default_pool
            .clone())
    }

    async fn set_default_pool(&self, names: &[String], pools: &[String]) -> RemoteResult<()> {
        const M: &str = "virtual_server.set_default_pool";
        let mut s = self.state();
        s.record(M, json!({"names": names, "pools": pools}), true)?;
        for (name, pool) in names.iter().zip(pools) {
            let pool = s.qualify_optional(pool);
            s.server_mut(name, M)?.default_pool = pool;
        }
        Ok(())
    }

    async fn get_object_status(&self, names: &[String]) -> RemoteResult<Vec<ObjectStatus>> {
        vs_getter!(self, names, "virtual_server.get_object_status", |vs| status_for(
            vs.enabled
        ))
    }

    async fn set_enabled_state(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        vs_setter!(self, names, states, "virtual_server.set_enabled_state", |vs, value| {
            vs.enabled = value.is_enabled()
        })
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        vs_getter!(self, names, "virtual_server.get_description", |vs| vs
            .description
            .clone())
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        vs_setter!(self, names, descriptions, "virtual_server.set_description", |vs, value| {
            vs.description = value.clone()
        })
    }

    async fn get_source_address(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        vs_getter!(self, names, "virtual_server.get_source_address", |vs| vs
            .source_address
            .clone())
    }

    async fn set_source_address(&self, names: &[String], addresses: &[String]) -> RemoteResult<()> {
        vs_setter!(self, names, addresses, "virtual_server.set_source_address", |vs, value| {
            vs.source_address = value.clone()
        })
    }

    async fn get_translate_address(&self, names: &[String]) -> RemoteResult<Vec<EnabledState>> {
        vs_getter!(self, names, "virtual_server.get_translate_address", |vs| vs
            .translate_address)
    }

    async fn set_translate_address(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        vs_setter!(self, names, states, "virtual_server.set_translate_address", |vs, value| {
            vs.translate_address = *value
        })
    }

    async fn get_translate_port(&self, names: &[String]) -> RemoteResult<Vec<EnabledState>> {
        vs_getter!(self, names, "virtual_server.get_translate_port", |vs| vs.translate_port)
    }

    async fn set_translate_port(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        vs_setter!(self, names, states, "virtual_server.set_translate_port", |vs, value| {
            vs.translate_port = *value
        })
    }

    async fn get_profile(&self, names: &[String]) -> RemoteResult<Vec<Vec<ProfileAttribute>>> {
        vs_getter!(self, names, "virtual_server.get_profile", |vs| vs.profiles.clone())
    }

    async fn add_profile(
        &self,
        names: &[String],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()> {
        const M: &str = "virtual_server.add_profile";
        let mut s = self.state();
        s.record(M, json!({"names": names, "profiles": profiles}), true)?;
        for (name, profiles) in names.iter().zip(profiles) {
            let profiles: Vec<ProfileAttribute> = profiles
                .iter()
                .map(|p| ProfileAttribute {
                    profile_context: p.profile_context,
                    profile_name: s.qualify(&p.profile_name),
                })
                .collect();
            let server = s.server_mut(name, M)?;
            for profile in profiles {
                if server
                    .profiles
                    .iter()
                    .any(|p| p.profile_name == profile.profile_name)
                {
                    return Err(device_error(M, "profile is already bound"));
                }
                server.profiles.push(profile);
            }
        }
        Ok(())
    }

    async fn remove_profile(
        &self,
        names: &[String],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()> {
        const M: &str = "virtual_server.remove_profile";
        let mut s = self.state();
        s.record(M, json!({"names": names, "profiles": profiles}), true)?;
        for (name, profiles) in names.iter().zip(profiles) {
            let server = s.server_mut(name, M)?;
            for profile in profiles {
                server
                    .profiles
                    .retain(|p| !same_object(&p.profile_name, &profile.profile_name));
            }
        }
        Ok(())
    }

    async fn get_vlan(&self, names: &[String]) -> RemoteResult<Vec<VlanFilter>> {
        vs_getter!(self, names, "virtual_server.get_vlan", |vs| vs.vlans.clone())
    }

    async fn set_vlan(&self, names: &[String], vlans: &[VlanFilter]) -> RemoteResult<()> {
        const M: &str = "virtual_server.set_vlan";
        let mut s = self.state();
        s.record(M, json!({"names": names, "vlans": vlans}), true)?;
        for (name, filter) in names.iter().zip(vlans) {
            let filter = VlanFilter {
                state: filter.state,
                vlans: filter.vlans.iter().map(|v| s.qualify(v)).collect(),
            };
            s.server_mut(name, M)?.vlans = filter;
        }
        Ok(())
    }

    async fn get_snat_type(&self, names: &[String]) -> RemoteResult<Vec<SnatType>> {
        vs_getter!(self, names, "virtual_server.get_snat_type", |vs| vs.snat_type)
    }

    async fn get_snat_pool(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        vs_getter!(self, names, "virtual_server.get_snat_pool", |vs| vs.snat_pool.clone())
    }

    async fn set_snat_none(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "virtual_server.set_snat_none";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let server = s.server_mut(name, M)?;
            server.snat_type = SnatType::None;
            server.snat_pool.clear();
        }
        Ok(())
    }

    async fn set_snat_automap(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "virtual_server.set_snat_automap";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let server = s.server_mut(name, M)?;
            server.snat_type = SnatType::Automap;
            server.snat_pool.clear();
        }
        Ok(())
    }

    async fn set_snat_pool(&self, names: &[String], pools: &[String]) -> RemoteResult<()> {
        const M: &str = "virtual_server.set_snat_pool";
        let mut s = self.state();
        s.record(M, json!({"names": names, "pools": pools}), true)?;
        for (name, pool) in names.iter().zip(pools) {
            let pool = s.qualify(pool);
            let server = s.server_mut(name, M)?;
            server.snat_type = SnatType::SnatPool;
            server.snat_pool = pool;
        }
        Ok(())
    }

    async fn get_persistence_profile(
        &self,
        names: &[String],
    ) -> RemoteResult<Vec<Vec<PersistenceProfile>>> {
        vs_getter!(self, names, "virtual_server.get_persistence_profile", |vs| vs
            .persistence
            .clone())
    }

    async fn add_persistence_profile(
        &self,
        names: &[String],
        profiles: &[Vec<PersistenceProfile>],
    ) -> RemoteResult<()> {
        const M: &str = "virtual_server.add_persistence_profile";
        let mut s = self.state();
        s.record(M, json!({"names": names, "profiles": profiles}), true)?;
        for (name, profiles) in names.iter().zip(profiles) {
            let profiles: Vec<PersistenceProfile> = profiles
                .iter()
                .map(|p| PersistenceProfile {
                    profile_name: s.qualify(&p.profile_name),
                    default_profile: p.default_profile,
                })
                .collect();
            s.server_mut(name, M)?.persistence.extend(profiles);
        }
        Ok(())
    }

    async fn remove_all_persistence_profiles(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "virtual_server.remove_all_persistence_profiles";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            s.server_mut(name, M)?.persistence.clear();
        }
        Ok(())
    }

    async fn get_fallback_persistence_profile(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        vs_getter!(self, names, "virtual_server.get_fallback_persistence_profile", |vs| vs
            .fallback_persistence
            .clone())
    }

    async fn set_fallback_persistence_profile(
        &self,
        names: &[String],
        profiles: &[String],
    ) -> RemoteResult<()> {
        const M: &str = "virtual_server.set_fallback_persistence_profile";
        let mut s = self.state();
        s.record(M, json!({"names": names, "profiles": profiles}), true)?;
        for (name, profile) in names.iter().zip(profiles) {
            let profile = s.qualify_optional(profile);
            s.server_mut(name, M)?.fallback_persistence = profile;
        }
        Ok(())
    }

    async fn get_rules(&self, names: &[String]) -> RemoteResult<Vec<Vec<RuleAssignment>>> {
        const M: &str = "virtual_server.get_rules";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| {
                s.server(n, M).map(|vs| {
                    s.rule_assignments
                        .get(&vs.name)
                        .cloned()
                        .unwrap_or_default()
                })
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn add_rules(&self, names: &[String], rules: &[Vec<RuleAssignment>]) -> RemoteResult<()> {
        const M: &str = "virtual_server.add_rules";
        let mut s = self.state();
        s.record(M, json!({"names": names, "rules": rules}), true)?;
        for (name, rules) in names.iter().zip(rules) {
            let server = s.server(name, M)?.name.clone();
            let rules: Vec<RuleAssignment> = rules
                .iter()
                .map(|r| RuleAssignment {
                    rule_name: s.qualify(&r.rule_name),
                    priority: r.priority,
                })
                .collect();
            let assigned = s.rule_assignments.entry(server).or_default();
            for rule in rules {
                if assigned.iter().any(|a| a.priority == rule.priority) {
                    return Err(device_error(M, "rule priority is already taken"));
                }
                assigned.push(rule);
            }
        }
        Ok(())
    }

    async fn remove_all_rules(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "virtual_server.remove_all_rules";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let server = s.server(name, M)?.name.clone();
            s.rule_assignments.insert(server, Vec::new());
        }
        Ok(())
    }
}

// ============================================================================
// Monitors
// ============================================================================

#[async_trait]
impl MonitorService for FakeDevice {
    async fn create_template(
        &self,
        templates: &[MonitorTemplate],
        attributes: &[CommonAttributes],
    ) -> RemoteResult<()> {
        const M: &str = "monitor.create_template";
        let mut s = self.state();
        s.record(M, json!({"templates": templates, "attributes": attributes}), true)?;
        for (template, attrs) in templates.iter().zip(attributes) {
            let name = s.qualify(&template.template_name);
            if s.monitors.iter().any(|m| m.name == name) {
                return Err(device_error(M, format!("monitor {name} already exists")));
            }
            let (parent, inferred) = s.parent_type(&attrs.parent_template).ok_or_else(|| {
                device_error(M, format!("parent {} was not found", attrs.parent_template))
            })?;
            s.monitors.push(Monitor {
                name,
                monitor_type: template.template_type.unwrap_or(inferred),
                parent,
                interval: attrs.interval,
                timeout: attrs.timeout,
                description: attrs.description.clone(),
                destination: attrs.dest_ipport.clone(),
                user_values: BTreeMap::new(),
            });
        }
        Ok(())
    }

    async fn delete_template(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "monitor.delete_template";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let name = s.monitor(name, M)?.name.clone();
            s.monitors.retain(|m| m.name != name);
        }
        Ok(())
    }

    async fn get_template_list(&self) -> RemoteResult<Vec<MonitorTemplate>> {
        let mut s = self.state();
        s.record("monitor.get_template_list", Value::Null, false)?;
        let users = s
            .monitors
            .iter()
            .filter(|m| s.visible(&m.name))
            .map(|m| MonitorTemplate {
                template_name: m.name.clone(),
                template_type: Some(m.monitor_type),
            });
        Ok(s.root_monitors.iter().cloned().chain(users).collect())
    }

    async fn is_template_root(&self, names: &[String]) -> RemoteResult<Vec<bool>> {
        const M: &str = "monitor.is_template_root";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.root_monitors.iter().any(|r| &r.template_name == n))
            .collect();
        Ok(s.finish(M, values))
    }

    async fn get_parent_template(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        const M: &str = "monitor.get_parent_template";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.monitor(n, M).map(|m| m.parent.clone()))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn get_template_destination(&self, names: &[String]) -> RemoteResult<Vec<MonitorIpPort>> {
        const M: &str = "monitor.get_template_destination";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.monitor(n, M).map(|m| m.destination.clone()))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_template_destination(
        &self,
        names: &[String],
        destinations: &[MonitorIpPort],
    ) -> RemoteResult<()> {
        const M: &str = "monitor.set_template_destination";
        let mut s = self.state();
        s.record(M, json!({"names": names, "destinations": destinations}), true)?;
        for (name, destination) in names.iter().zip(destinations) {
            s.monitor_mut(name, M)?.destination = destination.clone();
        }
        Ok(())
    }

    async fn get_integer_property(
        &self,
        names: &[String],
        property_types: &[IntegerPropertyType],
    ) -> RemoteResult<Vec<IntegerProperty>> {
        const M: &str = "monitor.get_integer_property";
        let mut s = self.state();
        s.record(M, json!({"names": names, "types": property_types}), false)?;
        let values = names
            .iter()
            .zip(property_types)
            .map(|(n, property_type)| {
                s.monitor(n, M).map(|m| IntegerProperty {
                    property_type: *property_type,
                    value: match property_type {
                        IntegerPropertyType::Interval => m.interval,
                        IntegerPropertyType::Timeout => m.timeout,
                        _ => 0,
                    },
                })
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_integer_property(
        &self,
        names: &[String],
        values: &[IntegerProperty],
    ) -> RemoteResult<()> {
        const M: &str = "monitor.set_integer_property";
        let mut s = self.state();
        s.record(M, json!({"names": names, "values": values}), true)?;
        for (name, property) in names.iter().zip(values) {
            let monitor = s.monitor_mut(name, M)?;
            match property.property_type {
                IntegerPropertyType::Interval => monitor.interval = property.value,
                IntegerPropertyType::Timeout => monitor.timeout = property.value,
                _ => {}
            }
        }
        Ok(())
    }

    async fn get_string_property(
        &self,
        names: &[String],
        property_types: &[StringPropertyType],
    ) -> RemoteResult<Vec<StringProperty>> {
        const M: &str = "monitor.get_string_property";
        let mut s = self.state();
        s.record(M, json!({"names": names, "types": property_types}), false)?;
        let values = names
            .iter()
            .zip(property_types)
            .map(|(n, property_type)| {
                s.monitor(n, M).map(|m| StringProperty {
                    property_type: *property_type,
                    value: m.user_values.get(property_type).cloned().unwrap_or_default(),
                })
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_string_property(
        &self,
        names: &[String],
        values: &[StringProperty],
    ) -> RemoteResult<()> {
        const M: &str = "monitor.set_string_property";
        let mut s = self.state();
        s.record(M, json!({"names": names, "values": values}), true)?;
        for (name, property) in names.iter().zip(values) {
            let monitor = s.monitor_mut(name, M)?;
            if !property.property_type.allowed_for(monitor.monitor_type) {
                return Err(device_error(M, "property is not valid for the monitor type"));
            }
            monitor
                .user_values
                .insert(property.property_type, property.value.clone());
        }
        Ok(())
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        const M: &str = "monitor.get_description";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| s.monitor(n, M).map(|m| m.description.clone()))
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        const M: &str = "monitor.set_description";
        let mut s = self.state();
        s.record(M, json!({"names": names, "descriptions": descriptions}), true)?;
        for (name, description) in names.iter().zip(descriptions) {
            s.monitor_mut(name, M)?.description = description.clone();
        }
        Ok(())
    }
}

// ============================================================================
// Data classes
// ============================================================================

/// Values stored for `members`, looked up by member key.
fn values_for<K: PartialEq>(
    stored: &[K],
    values: &[String],
    members: &[K],
    method: &'static str,
) -> RemoteResult<Vec<String>> {
    members
        .iter()
        .map(|member| {
            stored
                .iter()
                .position(|m| m == member)
                .map(|idx| values.get(idx).cloned().unwrap_or_default())
                .ok_or_else(|| device_error(method, "member was not found"))
        })
        .collect()
}

/// Replace the member list, keeping values of members that survive.
fn replace_members<K: PartialEq + Clone>(
    stored: &mut Vec<K>,
    values: &mut Vec<String>,
    members: &[K],
) {
    let kept: Vec<String> = members
        .iter()
        .map(|member| {
            stored
                .iter()
                .position(|m| m == member)
                .and_then(|idx| values.get(idx).cloned())
                .unwrap_or_default()
        })
        .collect();
    *stored = members.to_vec();
    *values = kept;
}

#[async_trait]
impl ClassService for FakeDevice {
    async fn get_address_class(&self, names: &[String]) -> RemoteResult<Vec<AddressClass>> {
        const M: &str = "class.get_address_class";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| {
                let name = s.qualify(n);
                s.address_classes
                    .iter()
                    .find(|(class, _)| class.name == name)
                    .map(|(class, _)| class.clone())
                    .unwrap_or(AddressClass {
                        name,
                        members: Vec::new(),
                    })
            })
            .collect();
        Ok(s.finish(M, values))
    }

    async fn create_address_class(&self, classes: &[AddressClass]) -> RemoteResult<()> {
        const M: &str = "class.create_address_class";
        let mut s = self.state();
        s.record(M, json!({"classes": classes}), true)?;
        for class in classes {
            let name = s.qualify(&class.name);
            if s.address_classes.iter().any(|(c, _)| c.name == name) {
                return Err(device_error(M, format!("class {name} already exists")));
            }
            let values = vec![String::new(); class.members.len()];
            s.address_classes.push((
                AddressClass {
                    name,
                    members: class.members.clone(),
                },
                values,
            ));
        }
        Ok(())
    }

    async fn modify_address_class(&self, classes: &[AddressClass]) -> RemoteResult<()> {
        const M: &str = "class.modify_address_class";
        let mut s = self.state();
        s.record(M, json!({"classes": classes}), true)?;
        for class in classes {
            let name = s.qualify(&class.name);
            let (stored, values) = s
                .address_classes
                .iter_mut()
                .find(|(c, _)| c.name == name)
                .ok_or_else(|| device_error(M, format!("class {name} was not found")))?;
            replace_members(&mut stored.members, values, &class.members);
        }
        Ok(())
    }

    async fn get_address_class_member_data_value(
        &self,
        classes: &[AddressClass],
    ) -> RemoteResult<Vec<Vec<String>>> {
        const M: &str = "class.get_address_class_member_data_value";
        let mut s = self.state();
        s.record(M, json!({"classes": classes}), false)?;
        let values = classes
            .iter()
            .map(|class| {
                let name = s.qualify(&class.name);
                let (stored, values) = s
                    .address_classes
                    .iter()
                    .find(|(c, _)| c.name == name)
                    .ok_or_else(|| device_error(M, format!("class {name} was not found")))?;
                values_for(&stored.members, values, &class.members, M)
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_address_class_member_data_value(
        &self,
        classes: &[AddressClass],
        values: &[Vec<String>],
    ) -> RemoteResult<()> {
        const M: &str = "class.set_address_class_member_data_value";
        let mut s = self.state();
        s.record(M, json!({"classes": classes, "values": values}), true)?;
        for (class, new_values) in classes.iter().zip(values) {
            let name = s.qualify(&class.name);
            let (stored, stored_values) = s
                .address_classes
                .iter_mut()
                .find(|(c, _)| c.name == name)
                .ok_or_else(|| device_error(M, format!("class {name} was not found")))?;
            for (member, value) in class.members.iter().zip(new_values) {
                let idx = stored
                    .members
                    .iter()
                    .position(|m| m == member)
                    .ok_or_else(|| device_error(M, "member was not found"))?;
                stored_values[idx] = value.clone();
            }
        }
        Ok(())
    }

    async fn get_string_class(&self, names: &[String]) -> RemoteResult<Vec<StringClass>> {
        const M: &str = "class.get_string_class";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let values = names
            .iter()
            .map(|n| {
                let name = s.qualify(n);
                s.string_classes
                    .iter()
                    .find(|(class, _)| class.name == name)
                    .map(|(class, _)| class.clone())
                    .unwrap_or(StringClass {
                        name,
                        members: Vec::new(),
                    })
            })
            .collect();
        Ok(s.finish(M, values))
    }

    async fn create_string_class(&self, classes: &[StringClass]) -> RemoteResult<()> {
        const M: &str = "class.create_string_class";
        let mut s = self.state();
        s.record(M, json!({"classes": classes}), true)?;
        for class in classes {
            let name = s.qualify(&class.name);
            if s.string_classes.iter().any(|(c, _)| c.name == name) {
                return Err(device_error(M, format!("class {name} already exists")));
            }
            let values = vec![String::new(); class.members.len()];
            s.string_classes.push((
                StringClass {
                    name,
                    members: class.members.clone(),
                },
                values,
            ));
        }
        Ok(())
    }

    async fn modify_string_class(&self, classes: &[StringClass]) -> RemoteResult<()> {
        const M: &str = "class.modify_string_class";
        let mut s = self.state();
        s.record(M, json!({"classes": classes}), true)?;
        for class in classes {
            let name = s.qualify(&class.name);
            let (stored, values) = s
                .string_classes
                .iter_mut()
                .find(|(c, _)| c.name == name)
                .ok_or_else(|| device_error(M, format!("class {name} was not found")))?;
            replace_members(&mut stored.members, values, &class.members);
        }
        Ok(())
    }

    async fn get_string_class_member_data_value(
        &self,
        classes: &[StringClass],
    ) -> RemoteResult<Vec<Vec<String>>> {
        const M: &str = "class.get_string_class_member_data_value";
        let mut s = self.state();
        s.record(M, json!({"classes": classes}), false)?;
        let values = classes
            .iter()
            .map(|class| {
                let name = s.qualify(&class.name);
                let (stored, values) = s
                    .string_classes
                    .iter()
                    .find(|(c, _)| c.name == name)
                    .ok_or_else(|| device_error(M, format!("class {name} was not found")))?;
                values_for(&stored.members, values, &class.members, M)
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(s.finish(M, values))
    }

    async fn set_string_class_member_data_value(
        &self,
        classes: &[StringClass],
        values: &[Vec<String>],
    ) -> RemoteResult<()> {
        const M: &str = "class.set_string_class_member_data_value";
        let mut s = self.state();
        s.record(M, json!({"classes": classes, "values": values}), true)?;
        for (class, new_values) in classes.iter().zip(values) {
            let name = s.qualify(&class.name);
            let (stored, stored_values) = s
                .string_classes
                .iter_mut()
                .find(|(c, _)| c.name == name)
                .ok_or_else(|| device_error(M, format!("class {name} was not found")))?;
            for (member, value) in class.members.iter().zip(new_values) {
                let idx = stored
                    .members
                    .iter()
                    .position(|m| m == member)
                    .ok_or_else(|| device_error(M, "member was not found"))?;
                stored_values[idx] = value.clone();
            }
        }
        Ok(())
    }

    async fn delete_class(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "class.delete_class";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let name = s.qualify(name);
            let before = s.address_classes.len() + s.string_classes.len();
            s.address_classes.retain(|(c, _)| c.name != name);
            s.string_classes.retain(|(c, _)| c.name != name);
            if s.address_classes.len() + s.string_classes.len() == before {
                return Err(device_error(M, format!("class {name} was not found")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// iRules
// ============================================================================

#[async_trait]
impl RuleService for FakeDevice {
    async fn create(&self, rules: &[RuleDefinition]) -> RemoteResult<()> {
        const M: &str = "rule.create";
        let mut s = self.state();
        s.record(M, json!({"rules": rules}), true)?;
        for rule in rules {
            let name = s.qualify(&rule.rule_name);
            if s.rules.iter().any(|r| r.rule_name == name) {
                return Err(device_error(M, format!("rule {name} already exists")));
            }
            s.rules.push(RuleDefinition {
                rule_name: name,
                rule_definition: rule.rule_definition.clone(),
            });
        }
        Ok(())
    }

    async fn modify(&self, rules: &[RuleDefinition]) -> RemoteResult<()> {
        const M: &str = "rule.modify";
        let mut s = self.state();
        s.record(M, json!({"rules": rules}), true)?;
        for rule in rules {
            let name = s.qualify(&rule.rule_name);
            let stored = s
                .rules
                .iter_mut()
                .find(|r| r.rule_name == name)
                .ok_or_else(|| device_error(M, format!("rule {name} was not found")))?;
            stored.rule_definition = rule.rule_definition.clone();
        }
        Ok(())
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        const M: &str = "rule.delete";
        let mut s = self.state();
        s.record(M, json!({"names": names}), true)?;
        for name in names {
            let name = s.qualify(name);
            let before = s.rules.len();
            s.rules.retain(|r| r.rule_name != name);
            if s.rules.len() == before {
                return Err(device_error(M, format!("rule {name} was not found")));
            }
        }
        Ok(())
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("rule.list", Value::Null, false)?;
        Ok(s.rules.iter().map(|r| r.rule_name.clone()).collect())
    }

    async fn query(&self, names: &[String]) -> RemoteResult<Vec<RuleDefinition>> {
        const M: &str = "rule.query";
        let mut s = self.state();
        s.record(M, json!({"names": names}), false)?;
        let mut found = Vec::new();
        for name in names {
            let name = s.qualify(name);
            let rule = s
                .rules
                .iter()
                .find(|r| r.rule_name == name)
                .ok_or_else(|| device_error(M, format!("rule {name} was not found")))?;
            if !rule.rule_definition.is_empty() {
                found.push(rule.clone());
            }
        }
        Ok(found)
    }
}

// ============================================================================
// Certificates, config-sync and device facts
// ============================================================================

#[async_trait]
impl KeyCertificateService for FakeDevice {
    async fn get_certificate_list(&self, mode: ManagementMode) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("cert.get_certificate_list", json!({"mode": mode}), false)?;
        Ok(s.certificates.keys().cloned().collect())
    }

    async fn get_key_list(&self, mode: ManagementMode) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("cert.get_key_list", json!({"mode": mode}), false)?;
        Ok(s.keys.keys().cloned().collect())
    }

    async fn certificate_import_from_pem(
        &self,
        mode: ManagementMode,
        ids: &[String],
        pems: &[String],
        overwrite: bool,
    ) -> RemoteResult<()> {
        const M: &str = "cert.certificate_import_from_pem";
        let mut s = self.state();
        s.record(
            M,
            json!({"mode": mode, "ids": ids, "pem_count": pems.len(), "overwrite": overwrite}),
            true,
        )?;
        for (id, pem) in ids.iter().zip(pems) {
            let id = s.qualify(id);
            if s.certificates.contains_key(&id) && !overwrite {
                return Err(device_error(M, format!("certificate {id} already exists")));
            }
            s.certificates.insert(id, pem.clone());
        }
        Ok(())
    }

    async fn key_import_from_pem(
        &self,
        mode: ManagementMode,
        ids: &[String],
        pems: &[String],
        overwrite: bool,
    ) -> RemoteResult<()> {
        const M: &str = "cert.key_import_from_pem";
        let mut s = self.state();
        s.record(
            M,
            json!({"mode": mode, "ids": ids, "pem_count": pems.len(), "overwrite": overwrite}),
            true,
        )?;
        for (id, pem) in ids.iter().zip(pems) {
            let id = s.qualify(id);
            if s.keys.contains_key(&id) && !overwrite {
                return Err(device_error(M, format!("key {id} already exists")));
            }
            s.keys.insert(id, pem.clone());
        }
        Ok(())
    }

    async fn certificate_delete(&self, mode: ManagementMode, ids: &[String]) -> RemoteResult<()> {
        const M: &str = "cert.certificate_delete";
        let mut s = self.state();
        s.record(M, json!({"mode": mode, "ids": ids}), true)?;
        for id in ids {
            let id = s.qualify(id);
            if s.certificates.remove(&id).is_none() {
                return Err(device_error(M, format!("certificate {id} was not found")));
            }
        }
        Ok(())
    }

    async fn key_delete(&self, mode: ManagementMode, ids: &[String]) -> RemoteResult<()> {
        const M: &str = "cert.key_delete";
        let mut s = self.state();
        s.record(M, json!({"mode": mode, "ids": ids}), true)?;
        for id in ids {
            let id = s.qualify(id);
            if s.keys.remove(&id).is_none() {
                return Err(device_error(M, format!("key {id} was not found")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigSyncService for FakeDevice {
    async fn synchronize_to_group(&self, group: &str, device: &str, force: bool) -> RemoteResult<()> {
        let mut s = self.state();
        s.record(
            "config_sync.synchronize_to_group",
            json!({"group": group, "device": device, "force": force}),
            true,
        )?;
        s.syncs.push((group.to_string(), device.to_string()));
        Ok(())
    }
}

#[async_trait]
impl SessionService for FakeDevice {
    async fn get_active_folder(&self) -> RemoteResult<String> {
        let mut s = self.state();
        s.record("session.get_active_folder", Value::Null, false)?;
        Ok(format!("/{}", s.active_folder))
    }

    async fn set_active_folder(&self, folder: &str) -> RemoteResult<()> {
        const M: &str = "session.set_active_folder";
        let mut s = self.state();
        s.record(M, json!({"folder": folder}), false)?;
        let folder = folder.trim_matches('/').to_string();
        if !s.partitions.contains(&folder) {
            return Err(device_error(M, format!("folder {folder} does not exist")));
        }
        s.active_folder = folder;
        Ok(())
    }

    async fn get_partition_list(&self) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("session.get_partition_list", Value::Null, false)?;
        Ok(s.partitions.clone())
    }
}

#[async_trait]
impl FailoverService for FakeDevice {
    async fn get_failover_state(&self) -> RemoteResult<FailoverState> {
        let mut s = self.state();
        s.record("failover.get_failover_state", Value::Null, false)?;
        Ok(s.failover_state)
    }
}

#[async_trait]
impl DeviceGroupService for FakeDevice {
    async fn get_list(&self) -> RemoteResult<Vec<String>> {
        let mut s = self.state();
        s.record("device_group.get_list", Value::Null, false)?;
        Ok(s.device_groups.clone())
    }
}

#[async_trait]
impl InetService for FakeDevice {
    async fn get_hostname(&self) -> RemoteResult<String> {
        let mut s = self.state();
        s.record("inet.get_hostname", Value::Null, false)?;
        Ok(s.hostname.clone())
    }
}
