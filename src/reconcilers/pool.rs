// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pool reconciliation.
//!
//! Members are compared on folder-stripped address and port only. The monitor
//! association is always replaced as a whole, with a rule type derived from
//! the number of monitors.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::slice;
use std::time::Instant;
use tracing::debug;

use super::{apply_actions, finish, ReconcileOutcome, RemoteMutation, RemoteResultExt};
use crate::collections::{member_key, Pool};
use crate::constants::MONITOR_RULE_QUORUM;
use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, ResourceKind};
use crate::icontrol::types::{
    LbMethod, MemberAddress, MonitorAssociation, MonitorRule, MonitorRuleType,
};
use crate::icontrol::{Remote, RemoteResult};
use crate::names::strip_folder;
use crate::partition::CollectionKind;
use crate::resources::PoolSpec;

const KIND: ResourceKind = ResourceKind::Pool;

/// Remote mutations on pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PoolAction {
    Create {
        name: String,
        lb_method: LbMethod,
        members: Vec<MemberAddress>,
    },
    AddMembers {
        name: String,
        members: Vec<MemberAddress>,
    },
    RemoveMembers {
        name: String,
        members: Vec<MemberAddress>,
    },
    /// Replace the whole monitor association
    SetMonitors {
        name: String,
        monitors: Vec<String>,
    },
    SetLbMethod {
        name: String,
        lb_method: LbMethod,
    },
    SetDescription {
        name: String,
        description: String,
    },
    Delete {
        name: String,
    },
}

#[async_trait]
impl RemoteMutation for PoolAction {
    fn operation(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::AddMembers { .. } => "add members",
            Self::RemoveMembers { .. } => "remove members",
            Self::SetMonitors { .. } => "set monitor association",
            Self::SetLbMethod { .. } => "set lb method",
            Self::SetDescription { .. } => "set description",
            Self::Delete { .. } => "delete",
        }
    }

    async fn execute(&self, remote: &Remote) -> RemoteResult<()> {
        let api = &remote.pools;
        match self {
            Self::Create {
                name,
                lb_method,
                members,
            } => {
                api.create(slice::from_ref(name), &[*lb_method], slice::from_ref(members))
                    .await
            }
            Self::AddMembers { name, members } => {
                api.add_members(slice::from_ref(name), slice::from_ref(members))
                    .await
            }
            Self::RemoveMembers { name, members } => {
                api.remove_members(slice::from_ref(name), slice::from_ref(members))
                    .await
            }
            Self::SetMonitors { name, monitors } => {
                api.set_monitor_association(&[monitor_association(name, monitors)])
                    .await
            }
            Self::SetLbMethod { name, lb_method } => {
                api.set_lb_method(slice::from_ref(name), &[*lb_method]).await
            }
            Self::SetDescription { name, description } => {
                api.set_description(slice::from_ref(name), slice::from_ref(description))
                    .await
            }
            Self::Delete { name } => api.delete(slice::from_ref(name)).await,
        }
    }
}

/// Association record replacing a pool's monitors with `monitors`.
pub(crate) fn monitor_association(pool: &str, monitors: &[String]) -> MonitorAssociation {
    MonitorAssociation {
        pool_name: pool.to_string(),
        monitor_rule: MonitorRule {
            rule_type: MonitorRuleType::for_count(monitors.len()),
            quorum: MONITOR_RULE_QUORUM,
            monitor_templates: monitors.to_vec(),
        },
    }
}

/// Declared members with duplicates removed, in declaration order.
fn desired_members(desired: &PoolSpec) -> Vec<MemberAddress> {
    let mut seen = HashSet::new();
    desired
        .members
        .iter()
        .map(MemberAddress::from)
        .filter(|member| seen.insert(member_key(member)))
        .collect()
}

/// Declared monitors with duplicates removed, in declaration order.
fn desired_monitors(desired: &PoolSpec) -> Vec<String> {
    let mut seen = HashSet::new();
    desired
        .monitors
        .iter()
        .filter(|monitor| seen.insert(strip_folder(monitor).to_string()))
        .cloned()
        .collect()
}

/// Folder-stripped, sorted and de-duplicated monitor names.
fn monitor_set(monitors: &[String]) -> BTreeSet<&str> {
    monitors.iter().map(|m| strip_folder(m)).collect()
}

/// Creation of a pool that does not exist yet.
pub(crate) fn plan_create(desired: &PoolSpec) -> PoolAction {
    PoolAction::Create {
        name: desired.name.clone(),
        lb_method: desired.lb_method,
        members: desired_members(desired),
    }
}

/// Attribute changes for a pool that exists on the device.
pub(crate) fn plan_pool(current: &Pool, desired: &PoolSpec) -> Vec<PoolAction> {
    let mut actions = Vec::new();
    let name = current.name.clone();

    let wanted = desired_members(desired);
    let current_keys: HashSet<(String, String)> = current.members.iter().map(member_key).collect();
    let wanted_keys: HashSet<(String, String)> = wanted.iter().map(member_key).collect();

    let missing: Vec<MemberAddress> = wanted
        .into_iter()
        .filter(|member| !current_keys.contains(&member_key(member)))
        .collect();
    if !missing.is_empty() {
        actions.push(PoolAction::AddMembers {
            name: name.clone(),
            members: missing,
        });
    }

    let extra: Vec<MemberAddress> = current
        .members
        .iter()
        .filter(|member| !wanted_keys.contains(&member_key(member)))
        .cloned()
        .collect();
    if !extra.is_empty() {
        actions.push(PoolAction::RemoveMembers {
            name: name.clone(),
            members: extra,
        });
    }

    let monitors = desired_monitors(desired);
    if monitor_set(&current.monitors) != monitor_set(&monitors) {
        actions.push(PoolAction::SetMonitors {
            name: name.clone(),
            monitors,
        });
    }

    if current.lb_method != desired.lb_method {
        actions.push(PoolAction::SetLbMethod {
            name: name.clone(),
            lb_method: desired.lb_method,
        });
    }

    if current.description != desired.description {
        actions.push(PoolAction::SetDescription {
            name,
            description: desired.description.clone(),
        });
    }

    actions
}

/// Converge a pool to its declaration.
///
/// Monitors named by the pool must already exist on the device.
///
/// # Errors
///
/// Returns an error if a remote call fails or the pool is missing after creation.
pub async fn reconcile_pool(
    device: &mut LoadBalancer,
    desired: &PoolSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge(device, desired).await;
    finish(device, started, result)
}

async fn converge(
    device: &mut LoadBalancer,
    desired: &PoolSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let name = desired.name.as_str();
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;

    let exists = device
        .pools()
        .await
        .during(KIND, name, "load pools")?
        .find(name)
        .is_some();
    if !exists {
        apply_actions(device, &[plan_create(desired)], &mut outcome).await?;
        device.invalidate(CollectionKind::Pools);
    }

    let current = device
        .pools()
        .await
        .during(KIND, name, "load pools")?
        .find(name)
        .cloned()
        .ok_or_else(|| ReconcileError::MissingAfterCreate {
            kind: KIND,
            name: name.to_string(),
        })?;

    let actions = plan_pool(&current, desired);
    let applied = apply_actions(device, &actions, &mut outcome).await;
    if !actions.is_empty() {
        device.invalidate(CollectionKind::Pools);
    }
    applied.map(|()| outcome)
}

/// Delete a pool. The device discards its members with it.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn delete_pool(
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

    let Some(pool) = device
        .pools()
        .await
        .during(KIND, name, "load pools")?
        .find(name)
        .map(|pool| pool.name.clone())
    else {
        debug!(device = %device.hostname(), name, "Pool already absent");
        return Ok(outcome);
    };

    apply_actions(device, &[PoolAction::Delete { name: pool }], &mut outcome).await?;
    device.invalidate(CollectionKind::Pools);
    Ok(outcome)
}
