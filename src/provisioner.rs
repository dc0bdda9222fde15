// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Batch orchestration across devices.
//!
//! A batch is a list of [`DeviceDeclaration`]s. For every declaration the
//! provisioner converges the create set, then removes the delete set, in an
//! order that respects references between object kinds:
//!
//! | Phase  | Order                                                                                  |
//! |--------|----------------------------------------------------------------------------------------|
//! | create | nodes, monitors, address classes, string classes, iRules, SSL certificates, pools, virtual servers |
//! | delete | virtual servers, pools, monitors, iRules, address classes, string classes, SSL certificates, nodes |
//!
//! Vips are expanded into their nodes, pool and virtual server before the
//! create phase runs.
//!
//! A failing resource is logged and recorded; its siblings are still
//! reconciled. An unreachable device is recorded and skipped. Once the whole
//! batch has run, every device that changed is config-synced exactly once.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, ResourceKind};
use crate::icontrol::types::ManagementMode;
use crate::icontrol::{Remote, RpcClient};
use crate::reconcilers::{
    delete_address_class, delete_irule, delete_monitor, delete_node, delete_pool, delete_ssl_cert,
    delete_string_class, delete_virtual_server, reconcile_address_class, reconcile_irule,
    reconcile_monitor, reconcile_node, reconcile_pool, reconcile_ssl_cert, reconcile_string_class,
    reconcile_virtual_server, sync_config, ReconcileOutcome,
};
use crate::report::{Action, DeviceReport, ResourceReport, RunReport, SyncReport};
use crate::resources::{
    DataClassSpec, IRuleSpec, MonitorSpec, NodeSpec, PoolSpec, SslCertSpec, VipSpec,
    VirtualServerSpec,
};

/// Resources to converge on a device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateSet {
    pub nodes: Vec<NodeSpec>,
    pub monitors: Vec<MonitorSpec>,
    pub address_classes: Vec<DataClassSpec>,
    pub string_classes: Vec<DataClassSpec>,
    pub irules: Vec<IRuleSpec>,
    pub ssl_certs: Vec<SslCertSpec>,
    pub pools: Vec<PoolSpec>,
    pub virtual_servers: Vec<VirtualServerSpec>,
    /// Composite services, expanded by [`CreateSet::expanded`]
    pub vips: Vec<VipSpec>,
}

impl CreateSet {
    /// This set with every vip folded into plain nodes, pools and virtual
    /// servers, appended after the explicit ones of the same kind.
    ///
    /// A vip node already declared under the same name is not repeated.
    #[must_use]
    pub fn expanded(&self) -> CreateSet {
        let mut set = self.clone();
        for vip in std::mem::take(&mut set.vips) {
            for node in vip.node_specs() {
                if !set.nodes.iter().any(|n| n.name == node.name) {
                    set.nodes.push(node);
                }
            }
            set.pools.push(vip.pool_spec());
            set.virtual_servers.push(vip.virtual_server_spec());
        }
        set
    }
}

/// Names of resources to remove from a device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeleteSet {
    pub virtual_servers: Vec<String>,
    pub pools: Vec<String>,
    pub monitors: Vec<String>,
    pub irules: Vec<String>,
    pub address_classes: Vec<String>,
    pub string_classes: Vec<String>,
    pub ssl_certs: Vec<String>,
    pub nodes: Vec<String>,
}

/// Desired state for one device.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceDeclaration {
    /// Management hostname of the device
    pub hostname: String,

    #[serde(default)]
    pub create: CreateSet,

    #[serde(default)]
    pub delete: DeleteSet,
}

/// Opens a [`LoadBalancer`] session for a hostname.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(&self, hostname: &str) -> Result<LoadBalancer>;
}

/// Connects over the JSON RPC transport using [`Config`].
#[derive(Debug, Clone)]
pub struct RpcConnector {
    config: Config,
}

impl RpcConnector {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DeviceConnector for RpcConnector {
    async fn connect(&self, hostname: &str) -> Result<LoadBalancer> {
        let settings = self.config.connection_settings(hostname)?;
        let client = RpcClient::new(&settings)?;
        LoadBalancer::connect(hostname, Remote::from_client(Arc::new(client)))
            .await
            .with_context(|| format!("Failed to open a session on {hostname}"))
    }
}

/// One open session per hostname for the length of a run.
pub struct DeviceRegistry<C> {
    connector: C,
    devices: BTreeMap<String, LoadBalancer>,
}

impl<C: DeviceConnector> DeviceRegistry<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            devices: BTreeMap::new(),
        }
    }

    /// The session for `hostname`, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns the connector's error if the device cannot be reached.
    pub async fn get(&mut self, hostname: &str) -> Result<&mut LoadBalancer> {
        if !self.devices.contains_key(hostname) {
            let device = self.connector.connect(hostname).await?;
            info!(device = %hostname, folder = %device.active_folder(), "Connected to device");
            self.devices.insert(hostname.to_string(), device);
        }
        self.devices
            .get_mut(hostname)
            .ok_or_else(|| anyhow!("No session for {hostname}"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn record(
    report: &mut DeviceReport,
    action: Action,
    kind: ResourceKind,
    name: &str,
    result: Result<ReconcileOutcome, ReconcileError>,
) {
    if let Err(e) = &result {
        error!(
            device = %report.hostname,
            kind = %kind,
            name,
            action = ?action,
            error = %e,
            "Failed to reconcile resource"
        );
    }
    report
        .resources
        .push(ResourceReport::from_result(action, kind, name, result));
}

async fn create_all(device: &mut LoadBalancer, set: &CreateSet, report: &mut DeviceReport) {
    use ResourceKind as K;
    let action = Action::Create;
    let set = &set.expanded();

    for spec in &set.nodes {
        let result = reconcile_node(device, spec).await;
        record(report, action, K::Node, &spec.name, result);
    }
    for spec in &set.monitors {
        let result = reconcile_monitor(device, spec).await;
        record(report, action, K::Monitor, &spec.name, result);
    }
    for spec in &set.address_classes {
        let result = reconcile_address_class(device, spec).await;
        record(report, action, K::AddressClass, &spec.name, result);
    }
    for spec in &set.string_classes {
        let result = reconcile_string_class(device, spec).await;
        record(report, action, K::StringClass, &spec.name, result);
    }
    for spec in &set.irules {
        let result = reconcile_irule(device, spec).await;
        record(report, action, K::IRule, &spec.name, result);
    }
    for spec in &set.ssl_certs {
        let result = reconcile_ssl_cert(device, spec).await;
        record(report, action, K::SslCert, &spec.name, result);
    }
    for spec in &set.pools {
        let result = reconcile_pool(device, spec).await;
        record(report, action, K::Pool, &spec.name, result);
    }
    for spec in &set.virtual_servers {
        let result = reconcile_virtual_server(device, spec).await;
        record(report, action, K::VirtualServer, &spec.name, result);
    }
}

async fn delete_all(device: &mut LoadBalancer, set: &DeleteSet, report: &mut DeviceReport) {
    use ResourceKind as K;
    let action = Action::Delete;

    for name in &set.virtual_servers {
        let result = delete_virtual_server(device, name).await;
        record(report, action, K::VirtualServer, name, result);
    }
    for name in &set.pools {
        let result = delete_pool(device, name).await;
        record(report, action, K::Pool, name, result);
    }
    for name in &set.monitors {
        let result = delete_monitor(device, name).await;
        record(report, action, K::Monitor, name, result);
    }
    for name in &set.irules {
        let result = delete_irule(device, name).await;
        record(report, action, K::IRule, name, result);
    }
    for name in &set.address_classes {
        let result = delete_address_class(device, name).await;
        record(report, action, K::AddressClass, name, result);
    }
    for name in &set.string_classes {
        let result = delete_string_class(device, name).await;
        record(report, action, K::StringClass, name, result);
    }
    for name in &set.ssl_certs {
        let result = delete_ssl_cert(device, name, ManagementMode::Default).await;
        record(report, action, K::SslCert, name, result);
    }
    for name in &set.nodes {
        let result = delete_node(device, name).await;
        record(report, action, K::Node, name, result);
    }
}

/// The report for `hostname`, added on first use.
fn device_report<'a>(report: &'a mut RunReport, hostname: &str) -> &'a mut DeviceReport {
    let index = match report.devices.iter().position(|d| d.hostname == hostname) {
        Some(index) => index,
        None => {
            report.devices.push(DeviceReport::new(hostname));
            report.devices.len() - 1
        }
    };
    &mut report.devices[index]
}

/// Runs batches of declarations against devices.
pub struct Provisioner<C> {
    registry: DeviceRegistry<C>,
}

impl<C: DeviceConnector> Provisioner<C> {
    pub fn new(connector: C) -> Self {
        Self {
            registry: DeviceRegistry::new(connector),
        }
    }

    pub fn connector(&self) -> &C {
        &self.registry.connector
    }

    /// Converge every declaration, then config-sync each device that changed.
    pub async fn provision(&mut self, batch: &[DeviceDeclaration]) -> RunReport {
        let mut report = RunReport::new();
        info!(declarations = batch.len(), "Starting provisioning run");

        for declaration in batch {
            let hostname = declaration.hostname.as_str();
            let device_report = device_report(&mut report, hostname);

            let device = match self.registry.get(hostname).await {
                Ok(device) => device,
                Err(e) => {
                    error!(device = %hostname, error = %format!("{e:#}"), "Skipping unreachable device");
                    device_report.error = Some(format!("{e:#}"));
                    continue;
                }
            };

            create_all(device, &declaration.create, device_report).await;
            delete_all(device, &declaration.delete, device_report).await;
        }

        let changed: Vec<String> = report
            .devices
            .iter()
            .filter(|d| d.changed())
            .map(|d| d.hostname.clone())
            .collect();
        for hostname in changed {
            self.sync_device(&mut report, &hostname).await;
        }

        report.finish();
        report
    }

    /// Config-sync every declared device without converging anything.
    pub async fn sync_all(&mut self, batch: &[DeviceDeclaration]) -> RunReport {
        let mut report = RunReport::new();
        for declaration in batch {
            self.sync_device(&mut report, &declaration.hostname).await;
        }
        report.finish();
        report
    }

    async fn sync_device(&mut self, report: &mut RunReport, hostname: &str) {
        let device_report = device_report(report, hostname);
        if device_report.sync.is_some() {
            return;
        }

        let device = match self.registry.get(hostname).await {
            Ok(device) => device,
            Err(e) => {
                error!(device = %hostname, error = %format!("{e:#}"), "Skipping unreachable device");
                device_report.error = Some(format!("{e:#}"));
                return;
            }
        };

        let result = sync_config(device).await;
        if let Err(e) = &result {
            error!(device = %hostname, error = %e, "Config sync failed");
        }
        device_report.sync = Some(SyncReport::from(result));
    }
}
