// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Node reconciliation.
//!
//! A declared node is matched against the device twice: once by name and once
//! by address. When the two lookups disagree, every matched node is stale: it
//! is purged from the pools that reference its address (the device refuses to
//! delete a node a pool still uses) and deleted before the declared node is
//! created.

use async_trait::async_trait;
use std::slice;
use std::time::Instant;
use tracing::{debug, warn};

use super::{apply_actions, finish, ReconcileOutcome, RemoteMutation, RemoteResultExt};
use crate::collections::{Node, PoolCollection};
use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, ResourceKind};
use crate::icontrol::types::{EnabledState, MemberAddress};
use crate::icontrol::{Remote, RemoteResult};
use crate::names::strip_folder;
use crate::partition::CollectionKind;
use crate::resources::NodeSpec;

const KIND: ResourceKind = ResourceKind::Node;

/// Connection limit sent with every new node; 0 is unlimited.
const UNLIMITED_CONNECTIONS: u32 = 0;

/// Remote mutations on nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeAction {
    /// Remove the members of `pool` that reference a node being deleted
    PurgeFromPool {
        pool: String,
        members: Vec<MemberAddress>,
    },
    Delete {
        name: String,
    },
    Create {
        name: String,
        address: String,
    },
    SetEnabled {
        name: String,
        enabled: bool,
    },
    SetDescription {
        name: String,
        description: String,
    },
}

#[async_trait]
impl RemoteMutation for NodeAction {
    fn operation(&self) -> &'static str {
        match self {
            Self::PurgeFromPool { .. } => "purge from pool",
            Self::Delete { .. } => "delete",
            Self::Create { .. } => "create",
            Self::SetEnabled { .. } => "set enabled state",
            Self::SetDescription { .. } => "set description",
        }
    }

    async fn execute(&self, remote: &Remote) -> RemoteResult<()> {
        match self {
            Self::PurgeFromPool { pool, members } => {
                remote
                    .pools
                    .remove_members(slice::from_ref(pool), slice::from_ref(members))
                    .await
            }
            Self::Delete { name } => remote.nodes.delete(slice::from_ref(name)).await,
            Self::Create { name, address } => {
                remote
                    .nodes
                    .create(
                        slice::from_ref(name),
                        slice::from_ref(address),
                        &[UNLIMITED_CONNECTIONS],
                    )
                    .await
            }
            Self::SetEnabled { name, enabled } => {
                remote
                    .nodes
                    .set_enabled_state(slice::from_ref(name), &[EnabledState::from_flag(*enabled)])
                    .await
            }
            Self::SetDescription { name, description } => {
                remote
                    .nodes
                    .set_description(slice::from_ref(name), slice::from_ref(description))
                    .await
            }
        }
    }
}

/// Nodes that conflict with the declared name/address pair.
///
/// Empty when both lookups find the same node, or when neither finds anything.
pub(crate) fn stale_nodes(
    by_name: Option<&Node>,
    by_address: Option<&Node>,
) -> Vec<Node> {
    match (by_name, by_address) {
        (Some(a), Some(b)) if a.name == b.name => Vec::new(),
        (a, b) => a.into_iter().chain(b).cloned().collect(),
    }
}

/// Purge-then-delete actions for `stale` nodes.
pub(crate) fn plan_removal(stale: &[Node], pools: &PoolCollection) -> Vec<NodeAction> {
    let mut actions = Vec::new();
    for node in stale {
        let wanted = strip_folder(&node.address);
        for pool in pools.referencing_address(&node.address) {
            let members: Vec<MemberAddress> = pool
                .members
                .iter()
                .filter(|member| strip_folder(&member.address) == wanted)
                .cloned()
                .collect();
            actions.push(NodeAction::PurgeFromPool {
                pool: pool.name.clone(),
                members,
            });
        }
        actions.push(NodeAction::Delete {
            name: node.name.clone(),
        });
    }
    actions
}

/// Attribute changes for a node that exists on the device.
///
/// With `preserve_status` set on a node that existed before this pass, the
/// enabled state found on the device wins.
pub(crate) fn plan_node(current: &Node, desired: &NodeSpec, existed_before: bool) -> Vec<NodeAction> {
    let mut actions = Vec::new();

    let enabled = if desired.preserve_status && existed_before {
        current.enabled
    } else {
        desired.enabled
    };
    if enabled != current.enabled {
        actions.push(NodeAction::SetEnabled {
            name: current.name.clone(),
            enabled,
        });
    }

    if current.description != desired.description {
        actions.push(NodeAction::SetDescription {
            name: current.name.clone(),
            description: desired.description.clone(),
        });
    }

    actions
}

/// Converge a node to its declaration.
///
/// # Errors
///
/// Returns an error if a remote call fails or the node is missing after creation.
pub async fn reconcile_node(
    device: &mut LoadBalancer,
    desired: &NodeSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge(device, desired).await;
    finish(device, started, result)
}

async fn converge(
    device: &mut LoadBalancer,
    desired: &NodeSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let name = desired.name.as_str();
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;

    let nodes = device.nodes().await.during(KIND, name, "load nodes")?;
    let by_name = nodes.find_by_name(name).cloned();
    let by_address = nodes.find_by_address(desired.address()).cloned();
    let stale = stale_nodes(by_name.as_ref(), by_address.as_ref());

    if !stale.is_empty() {
        warn!(
            device = %device.hostname(),
            name,
            address = desired.address(),
            stale = ?stale.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(),
            "Replacing nodes that conflict by name or address"
        );
        let pools = device.pools().await.during(KIND, name, "load pools")?;
        let removal = plan_removal(&stale, pools);
        let removed = apply_actions(device, &removal, &mut outcome).await;
        device.invalidate(CollectionKind::Pools);
        device.invalidate(CollectionKind::Nodes);
        removed?;
    }

    let existed_before = stale.is_empty() && by_name.is_some();
    if !existed_before {
        let create = [NodeAction::Create {
            name: name.to_string(),
            address: desired.address().to_string(),
        }];
        let created = apply_actions(device, &create, &mut outcome).await;
        device.invalidate(CollectionKind::Nodes);
        created?;
    }

    let current = device
        .nodes()
        .await
        .during(KIND, name, "load nodes")?
        .find_by_name(name)
        .cloned()
        .ok_or_else(|| ReconcileError::MissingAfterCreate {
            kind: KIND,
            name: name.to_string(),
        })?;

    let actions = plan_node(&current, desired, existed_before);
    let applied = apply_actions(device, &actions, &mut outcome).await;
    if !actions.is_empty() {
        device.invalidate(CollectionKind::Nodes);
    }
    applied.map(|()| outcome)
}

/// Delete a node, purging it from every pool that references it first.
///
/// Deleting a node that does not exist is a no-op.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn delete_node(
    device: &mut LoadBalancer,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = remove(device, name).await;
    finish(device, started, result)
}

async fn remove(device: &mut LoadBalancer, name: &str) -> Result<ReconcileOutcome, ReconcileError> {
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;

    let Some(node) = device
        .nodes()
        .await
        .during(KIND, name, "load nodes")?
        .find_by_name(name)
        .cloned()
    else {
        debug!(device = %device.hostname(), name, "Node already absent");
        return Ok(outcome);
    };

    let pools = device.pools().await.during(KIND, name, "load pools")?;
    let actions = plan_removal(slice::from_ref(&node), pools);
    let applied = apply_actions(device, &actions, &mut outcome).await;
    device.invalidate(CollectionKind::Pools);
    device.invalidate(CollectionKind::Nodes);
    applied.map(|()| outcome)
}
