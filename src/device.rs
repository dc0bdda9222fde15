// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-device handle.
//!
//! [`LoadBalancer`] bundles everything reconcilers need to talk to one
//! appliance: the typed [`Remote`] facade, the active folder, the collection
//! cache and a few device facts that never change during a run (failover
//! state, device groups, system hostname), fetched once on first use.

use std::collections::hash_map::Entry;
use tracing::debug;

use crate::collections::{
    MonitorCollection, NodeCollection, PoolCollection, VirtualServerCollection,
};
use crate::constants::{DEVICE_TRUST_GROUP_MARKER, GTM_DEVICE_GROUP};
use crate::errors::RemoteError;
use crate::icontrol::types::FailoverState;
use crate::icontrol::Remote;
use crate::names::qualify;
use crate::partition::{CollectionKind, FolderContext, LtmCache};

/// Whether a device group is a config-sync target.
///
/// Trust groups and the GTM sync group are never synchronised.
#[must_use]
pub fn is_sync_group(group: &str) -> bool {
    !group.contains(DEVICE_TRUST_GROUP_MARKER) && !group.contains(GTM_DEVICE_GROUP)
}

/// A connected load balancer.
#[derive(Debug)]
pub struct LoadBalancer {
    hostname: String,
    remote: Remote,
    folder: FolderContext,
    cache: LtmCache,
    failover_state: Option<FailoverState>,
    device_groups: Option<Vec<String>>,
    system_hostname: Option<String>,
}

impl LoadBalancer {
    /// Wrap a remote facade, reading the session's current folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the active folder cannot be read.
    pub async fn connect(hostname: impl Into<String>, remote: Remote) -> Result<Self, RemoteError> {
        let hostname = hostname.into();
        let active = remote.session.get_active_folder().await?;
        debug!(device = %hostname, folder = %active, "Connected to load balancer");

        Ok(Self {
            hostname,
            remote,
            folder: FolderContext::new(&active),
            cache: LtmCache::default(),
            failover_state: None,
            device_groups: None,
            system_hostname: None,
        })
    }

    /// Hostname the device was declared with.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[must_use]
    pub fn remote(&self) -> &Remote {
        &self.remote
    }

    /// Currently active folder, e.g. `Common`.
    #[must_use]
    pub fn active_folder(&self) -> &str {
        self.folder.active()
    }

    /// Qualify a bare name with the active folder.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        qualify(name, self.folder.active())
    }

    #[must_use]
    pub fn cache(&self) -> &LtmCache {
        &self.cache
    }

    /// Make `folder` active; a no-op when it already is.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the folder change.
    pub async fn change_folder(&mut self, folder: &str) -> Result<bool, RemoteError> {
        self.folder
            .switch_to(folder, self.remote.session.as_ref(), &mut self.cache)
            .await
    }

    /// Make the folder of `name` active if it is qualified; bare names keep the
    /// current folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the folder change.
    pub async fn change_folder_for(&mut self, name: &str) -> Result<bool, RemoteError> {
        let target = self.folder.folder_for(name).to_string();
        self.change_folder(&target).await
    }

    /// Drop the cached collection of `kind` so the next access reloads it.
    pub fn invalidate(&mut self, kind: CollectionKind) {
        self.cache.invalidate(kind);
    }

    /// Nodes of the active folder, loaded on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub async fn nodes(&mut self) -> Result<&NodeCollection, RemoteError> {
        match self.cache.nodes.entry(self.folder.active().to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(NodeCollection::load(&self.remote).await?)),
        }
    }

    /// Pools of the active folder, loaded on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub async fn pools(&mut self) -> Result<&PoolCollection, RemoteError> {
        match self.cache.pools.entry(self.folder.active().to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(PoolCollection::load(&self.remote).await?)),
        }
    }

    /// Virtual servers of the active folder, loaded on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub async fn virtual_servers(&mut self) -> Result<&VirtualServerCollection, RemoteError> {
        match self.cache.virtual_servers.entry(self.folder.active().to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                Ok(entry.insert(VirtualServerCollection::load(&self.remote).await?))
            }
        }
    }

    /// Monitors of the active folder, loaded on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub async fn monitors(&mut self) -> Result<&MonitorCollection, RemoteError> {
        Ok(&*self.monitors_mut().await?)
    }

    pub(crate) async fn monitors_mut(&mut self) -> Result<&mut MonitorCollection, RemoteError> {
        match self.cache.monitors.entry(self.folder.active().to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(MonitorCollection::load(&self.remote).await?)),
        }
    }

    /// Failover state, fetched once.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read.
    pub async fn failover_state(&mut self) -> Result<FailoverState, RemoteError> {
        if let Some(state) = self.failover_state {
            return Ok(state);
        }
        let state = self.remote.failover.get_failover_state().await?;
        self.failover_state = Some(state);
        Ok(state)
    }

    /// Whether this device is the active member of its HA pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the failover state cannot be read.
    pub async fn is_active(&mut self) -> Result<bool, RemoteError> {
        Ok(self.failover_state().await? == FailoverState::Active)
    }

    /// Device groups that are config-sync targets, fetched once.
    ///
    /// # Errors
    ///
    /// Returns an error if the group list cannot be read.
    pub async fn device_groups(&mut self) -> Result<&[String], RemoteError> {
        if self.device_groups.is_none() {
            let groups = self.remote.device_groups.get_list().await?;
            let groups: Vec<String> = groups.into_iter().filter(|g| is_sync_group(g)).collect();
            debug!(device = %self.hostname, groups = ?groups, "Loaded device groups");
            self.device_groups = Some(groups);
        }
        Ok(self.device_groups.as_deref().unwrap_or_default())
    }

    /// The device's own hostname as reported by the system, fetched once.
    ///
    /// # Errors
    ///
    /// Returns an error if the hostname cannot be read.
    pub async fn system_hostname(&mut self) -> Result<&str, RemoteError> {
        if self.system_hostname.is_none() {
            self.system_hostname = Some(self.remote.inet.get_hostname().await?);
        }
        Ok(self.system_hostname.as_deref().unwrap_or_default())
    }

    /// Partitions defined on the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn partitions(&self) -> Result<Vec<String>, RemoteError> {
        self.remote.session.get_partition_list().await
    }
}
