// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Config-sync to high-availability peers.
//!
//! Only the active member of an HA pair pushes its configuration, and only
//! to device groups that are sync targets. A standby device or a device
//! without peer groups is a no-op.

use serde::Serialize;
use tracing::{debug, info};

use super::RemoteResultExt;
use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, ResourceKind};
use crate::metrics::record_config_sync;

const KIND: ResourceKind = ResourceKind::ConfigSync;

/// What a config-sync trigger did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfigSyncOutcome {
    /// Configuration pushed to every listed group
    Synchronized { groups: Vec<String> },
    /// The device is not the active member of its pair
    NotActive,
    /// The device belongs to no sync group
    NoPeers,
}

/// Push the device's configuration to each of its sync groups.
///
/// Every group is synchronised with `force` set, from the device's own
/// system hostname.
///
/// # Errors
///
/// Returns an error if the device facts cannot be read or a sync call fails.
pub async fn sync_config(device: &mut LoadBalancer) -> Result<ConfigSyncOutcome, ReconcileError> {
    let result = trigger(device).await;
    let status = match &result {
        Ok(ConfigSyncOutcome::Synchronized { .. }) => "success",
        Ok(_) => "skipped",
        Err(_) => "error",
    };
    record_config_sync(status);
    result
}

async fn trigger(device: &mut LoadBalancer) -> Result<ConfigSyncOutcome, ReconcileError> {
    let host = device.hostname().to_string();

    let active = device
        .is_active()
        .await
        .during(KIND, &host, "get failover state")?;
    if !active {
        debug!(device = %host, "Device is not active, skipping config sync");
        return Ok(ConfigSyncOutcome::NotActive);
    }

    let groups = device
        .device_groups()
        .await
        .during(KIND, &host, "list device groups")?
        .to_vec();
    if groups.is_empty() {
        debug!(device = %host, "No sync groups, skipping config sync");
        return Ok(ConfigSyncOutcome::NoPeers);
    }

    let system_hostname = device
        .system_hostname()
        .await
        .during(KIND, &host, "get hostname")?
        .to_string();

    for group in &groups {
        info!(device = %host, group = %group, source = %system_hostname, "Synchronizing configuration");
        device
            .remote()
            .config_sync
            .synchronize_to_group(group, &system_hostname, true)
            .await
            .during(KIND, &host, "synchronize to group")?;
    }

    Ok(ConfigSyncOutcome::Synchronized { groups })
}
