// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Virtual server reconciliation.
//!
//! Creation submits only what the device requires up front (destination,
//! protocol, wildmask, type, default pool, profiles); everything else is
//! converged by a second plan against the freshly created server.
//!
//! # Attribute order
//!
//! The plan checks attributes in a fixed order, each guarding its own call:
//!
//! 1. Default pool, description, wildmask, source address, destination
//! 2. Remove all iRules when profiles or iRules differ
//! 3. Remove extra profiles
//! 4. Enabled state, address and port translation, VLANs, SNAT
//! 5. Persistence (see below)
//! 6. Add missing profiles, then re-add every iRule with priorities `1..n`
//!
//! Profile changes invalidate iRule bindings on the device, so iRules are
//! removed before any profile call and re-added last.
//!
//! # Persistence repair
//!
//! The device may report several default persistence profiles at once. When
//! it does, or when the default profile differs, persistence is rebuilt in a
//! strict sequence: clear the fallback, remove every default profile, add the
//! declared one (if any), then set the declared fallback. A fallback cannot be
//! set while an incompatible default profile is still bound.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::slice;
use std::time::Instant;
use tracing::debug;

use super::{apply_actions, finish, ReconcileOutcome, RemoteMutation, RemoteResultExt};
use crate::collections::VirtualServer;
use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, ResourceKind};
use crate::icontrol::types::{
    EnabledState, IpPort, PersistenceProfile, ProfileAttribute, ProfileContext, RuleAssignment,
    SnatType, VirtualServerDefinition, VirtualServerResource, VlanFilter,
};
use crate::icontrol::{Remote, RemoteResult};
use crate::names::{same_object, strip_folder};
use crate::partition::CollectionKind;
use crate::resources::VirtualServerSpec;

const KIND: ResourceKind = ResourceKind::VirtualServer;

/// Remote mutations on virtual servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VirtualServerAction {
    Create {
        definition: VirtualServerDefinition,
        wildmask: String,
        resource: VirtualServerResource,
        profiles: Vec<ProfileAttribute>,
    },
    SetDefaultPool {
        name: String,
        pool: String,
    },
    SetDescription {
        name: String,
        description: String,
    },
    SetWildmask {
        name: String,
        wildmask: String,
    },
    SetSourceAddress {
        name: String,
        address: String,
    },
    SetDestination {
        name: String,
        destination: IpPort,
    },
    RemoveAllRules {
        name: String,
    },
    RemoveProfiles {
        name: String,
        profiles: Vec<ProfileAttribute>,
    },
    SetEnabled {
        name: String,
        enabled: bool,
    },
    SetTranslateAddress {
        name: String,
        state: EnabledState,
    },
    SetTranslatePort {
        name: String,
        state: EnabledState,
    },
    SetVlans {
        name: String,
        vlans: VlanFilter,
    },
    SetSnat {
        name: String,
        snat_type: SnatType,
        pool: String,
    },
    SetFallbackPersistence {
        name: String,
        profile: String,
    },
    RemoveAllPersistence {
        name: String,
    },
    AddPersistence {
        name: String,
        profile: String,
    },
    AddProfiles {
        name: String,
        profiles: Vec<ProfileAttribute>,
    },
    AddRules {
        name: String,
        rules: Vec<RuleAssignment>,
    },
    Delete {
        name: String,
    },
}

#[async_trait]
impl RemoteMutation for VirtualServerAction {
    fn operation(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::SetDefaultPool { .. } => "set default pool",
            Self::SetDescription { .. } => "set description",
            Self::SetWildmask { .. } => "set wildmask",
            Self::SetSourceAddress { .. } => "set source address",
            Self::SetDestination { .. } => "set destination",
            Self::RemoveAllRules { .. } => "remove all rules",
            Self::RemoveProfiles { .. } => "remove profiles",
            Self::SetEnabled { .. } => "set enabled state",
            Self::SetTranslateAddress { .. } => "set translate address",
            Self::SetTranslatePort { .. } => "set translate port",
            Self::SetVlans { .. } => "set vlans",
            Self::SetSnat { .. } => "set snat",
            Self::SetFallbackPersistence { .. } => "set fallback persistence",
            Self::RemoveAllPersistence { .. } => "remove all persistence",
            Self::AddPersistence { .. } => "add persistence",
            Self::AddProfiles { .. } => "add profiles",
            Self::AddRules { .. } => "add rules",
            Self::Delete { .. } => "delete",
        }
    }

    async fn execute(&self, remote: &Remote) -> RemoteResult<()> {
        let api = &remote.virtual_servers;
        match self {
            Self::Create {
                definition,
                wildmask,
                resource,
                profiles,
            } => {
                api.create(
                    slice::from_ref(definition),
                    slice::from_ref(wildmask),
                    slice::from_ref(resource),
                    slice::from_ref(profiles),
                )
                .await
            }
            Self::SetDefaultPool { name, pool } => {
                api.set_default_pool(slice::from_ref(name), slice::from_ref(pool))
                    .await
            }
            Self::SetDescription { name, description } => {
                api.set_description(slice::from_ref(name), slice::from_ref(description))
                    .await
            }
            Self::SetWildmask { name, wildmask } => {
                api.set_wildmask(slice::from_ref(name), slice::from_ref(wildmask))
                    .await
            }
            Self::SetSourceAddress { name, address } => {
                api.set_source_address(slice::from_ref(name), slice::from_ref(address))
                    .await
            }
            Self::SetDestination { name, destination } => {
                api.set_destination(slice::from_ref(name), slice::from_ref(destination))
                    .await
            }
            Self::RemoveAllRules { name } => api.remove_all_rules(slice::from_ref(name)).await,
            Self::RemoveProfiles { name, profiles } => {
                api.remove_profile(slice::from_ref(name), slice::from_ref(profiles))
                    .await
            }
            Self::SetEnabled { name, enabled } => {
                api.set_enabled_state(slice::from_ref(name), &[EnabledState::from_flag(*enabled)])
                    .await
            }
            Self::SetTranslateAddress { name, state } => {
                api.set_translate_address(slice::from_ref(name), &[*state])
                    .await
            }
            Self::SetTranslatePort { name, state } => {
                api.set_translate_port(slice::from_ref(name), &[*state]).await
            }
            Self::SetVlans { name, vlans } => {
                api.set_vlan(slice::from_ref(name), slice::from_ref(vlans)).await
            }
            Self::SetSnat {
                name,
                snat_type,
                pool,
            } => match snat_type {
                SnatType::Automap => api.set_snat_automap(slice::from_ref(name)).await,
                SnatType::SnatPool => {
                    api.set_snat_pool(slice::from_ref(name), slice::from_ref(pool))
                        .await
                }
                _ => api.set_snat_none(slice::from_ref(name)).await,
            },
            Self::SetFallbackPersistence { name, profile } => {
                api.set_fallback_persistence_profile(slice::from_ref(name), slice::from_ref(profile))
                    .await
            }
            Self::RemoveAllPersistence { name } => {
                api.remove_all_persistence_profiles(slice::from_ref(name))
                    .await
            }
            Self::AddPersistence { name, profile } => {
                let profiles = vec![PersistenceProfile {
                    profile_name: profile.clone(),
                    default_profile: true,
                }];
                api.add_persistence_profile(slice::from_ref(name), &[profiles])
                    .await
            }
            Self::AddProfiles { name, profiles } => {
                api.add_profile(slice::from_ref(name), slice::from_ref(profiles))
                    .await
            }
            Self::AddRules { name, rules } => {
                api.add_rules(slice::from_ref(name), slice::from_ref(rules))
                    .await
            }
            Self::Delete { name } => api.delete(slice::from_ref(name)).await,
        }
    }
}

/// Profile identity for comparison: context and folder-stripped name.
fn profile_key(profile: &ProfileAttribute) -> (ProfileContext, &str) {
    (profile.profile_context, strip_folder(&profile.profile_name))
}

fn stripped_set(names: &[String]) -> BTreeSet<&str> {
    names.iter().map(|n| strip_folder(n)).collect()
}

/// iRules compare in order; order is priority.
fn rules_match(current: &[String], desired: &[String]) -> bool {
    current.len() == desired.len()
        && current
            .iter()
            .zip(desired)
            .all(|(current, desired)| same_object(current, desired))
}

/// Declared iRules with priorities `1..n` in declaration order.
pub(crate) fn rule_assignments(rules: &[String]) -> Vec<RuleAssignment> {
    rules
        .iter()
        .zip(1..)
        .map(|(rule, priority)| RuleAssignment {
            rule_name: rule.clone(),
            priority,
        })
        .collect()
}

/// Creation of a virtual server that does not exist yet.
pub(crate) fn plan_create(desired: &VirtualServerSpec) -> VirtualServerAction {
    VirtualServerAction::Create {
        definition: VirtualServerDefinition {
            name: desired.name.clone(),
            address: desired.destination_address.clone(),
            port: desired.destination_port,
            protocol: desired.protocol,
        },
        wildmask: desired.destination_wildmask.clone(),
        resource: VirtualServerResource {
            resource_type: desired.resource_type,
            default_pool_name: desired.default_pool.clone(),
        },
        profiles: desired.profiles.clone(),
    }
}

/// Attribute changes for a virtual server that exists on the device.
#[allow(clippy::too_many_lines)]
pub(crate) fn plan_virtual_server(
    current: &VirtualServer,
    desired: &VirtualServerSpec,
) -> Vec<VirtualServerAction> {
    use VirtualServerAction as A;

    let name = current.name.clone();
    let mut actions = Vec::new();

    if !same_object(&current.default_pool, &desired.default_pool) {
        actions.push(A::SetDefaultPool {
            name: name.clone(),
            pool: desired.default_pool.clone(),
        });
    }
    if current.description != desired.description {
        actions.push(A::SetDescription {
            name: name.clone(),
            description: desired.description.clone(),
        });
    }
    if current.wildmask != desired.destination_wildmask {
        actions.push(A::SetWildmask {
            name: name.clone(),
            wildmask: desired.destination_wildmask.clone(),
        });
    }
    if current.source_address != desired.source_address {
        actions.push(A::SetSourceAddress {
            name: name.clone(),
            address: desired.source_address.clone(),
        });
    }
    if !same_object(&current.destination.address, &desired.destination_address)
        || current.destination.port != desired.destination_port
    {
        actions.push(A::SetDestination {
            name: name.clone(),
            destination: IpPort {
                address: desired.destination_address.clone(),
                port: desired.destination_port,
            },
        });
    }

    let current_profiles: BTreeSet<_> = current.profiles.iter().map(profile_key).collect();
    let desired_profiles: BTreeSet<_> = desired.profiles.iter().map(profile_key).collect();
    let missing_profiles: Vec<ProfileAttribute> = desired
        .profiles
        .iter()
        .filter(|p| !current_profiles.contains(&profile_key(p)))
        .cloned()
        .collect();
    let extra_profiles: Vec<ProfileAttribute> = current
        .profiles
        .iter()
        .filter(|p| !desired_profiles.contains(&profile_key(p)))
        .cloned()
        .collect();
    let profiles_match = missing_profiles.is_empty() && extra_profiles.is_empty();
    let rules_match = rules_match(&current.rules, &desired.rules);

    if !profiles_match || !rules_match {
        actions.push(A::RemoveAllRules { name: name.clone() });
    }
    if !extra_profiles.is_empty() {
        actions.push(A::RemoveProfiles {
            name: name.clone(),
            profiles: extra_profiles,
        });
    }

    if current.enabled != desired.enabled {
        actions.push(A::SetEnabled {
            name: name.clone(),
            enabled: desired.enabled,
        });
    }
    let translate_address = EnabledState::from_flag(desired.translate_address);
    if current.translate_address != translate_address {
        actions.push(A::SetTranslateAddress {
            name: name.clone(),
            state: translate_address,
        });
    }
    let translate_port = EnabledState::from_flag(desired.translate_port);
    if current.translate_port != translate_port {
        actions.push(A::SetTranslatePort {
            name: name.clone(),
            state: translate_port,
        });
    }

    if current.vlans.state != desired.vlan_state
        || current.vlans.vlans.len() != desired.vlans.len()
        || stripped_set(&current.vlans.vlans) != stripped_set(&desired.vlans)
    {
        actions.push(A::SetVlans {
            name: name.clone(),
            vlans: VlanFilter {
                state: desired.vlan_state,
                vlans: desired.vlans.clone(),
            },
        });
    }

    let snat_pool_differs = desired.snat_type == SnatType::SnatPool
        && !same_object(&current.snat_pool, &desired.snat_pool);
    if current.snat_type != desired.snat_type || snat_pool_differs {
        actions.push(A::SetSnat {
            name: name.clone(),
            snat_type: desired.snat_type,
            pool: desired.snat_pool.clone(),
        });
    }

    let fallback_differs =
        !same_object(&current.fallback_persistence, &desired.fallback_persistence_profile);
    if current.persistence.len() > 1
        || !same_object(current.default_persistence(), &desired.default_persistence_profile)
    {
        actions.push(A::SetFallbackPersistence {
            name: name.clone(),
            profile: String::new(),
        });
        actions.push(A::RemoveAllPersistence { name: name.clone() });
        if !desired.default_persistence_profile.is_empty() {
            actions.push(A::AddPersistence {
                name: name.clone(),
                profile: desired.default_persistence_profile.clone(),
            });
        }
        actions.push(A::SetFallbackPersistence {
            name: name.clone(),
            profile: desired.fallback_persistence_profile.clone(),
        });
    } else if fallback_differs {
        actions.push(A::SetFallbackPersistence {
            name: name.clone(),
            profile: desired.fallback_persistence_profile.clone(),
        });
    }

    if !missing_profiles.is_empty() {
        actions.push(A::AddProfiles {
            name: name.clone(),
            profiles: missing_profiles,
        });
    }
    if (!profiles_match || !rules_match) && !desired.rules.is_empty() {
        actions.push(A::AddRules {
            name,
            rules: rule_assignments(&desired.rules),
        });
    }

    actions
}

/// Converge a virtual server to its declaration.
///
/// Pools, profiles and iRules it references must already exist.
///
/// # Errors
///
/// Returns a contract error for an inconsistent declaration, or an error if a
/// remote call fails or the server is missing after creation.
pub async fn reconcile_virtual_server(
    device: &mut LoadBalancer,
    desired: &VirtualServerSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge(device, desired).await;
    finish(device, started, result)
}

async fn converge(
    device: &mut LoadBalancer,
    desired: &VirtualServerSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let name = desired.name.as_str();
    let mut outcome = ReconcileOutcome::new(KIND, name);

    desired
        .validate()
        .map_err(|e| ReconcileError::contract(KIND, name, e))?;

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;

    let exists = device
        .virtual_servers()
        .await
        .during(KIND, name, "load virtual servers")?
        .find(name)
        .is_some();
    if !exists {
        apply_actions(device, &[plan_create(desired)], &mut outcome).await?;
        device.invalidate(CollectionKind::VirtualServers);
    }

    let current = device
        .virtual_servers()
        .await
        .during(KIND, name, "load virtual servers")?
        .find(name)
        .cloned()
        .ok_or_else(|| ReconcileError::MissingAfterCreate {
            kind: KIND,
            name: name.to_string(),
        })?;

    let actions = plan_virtual_server(&current, desired);
    let applied = apply_actions(device, &actions, &mut outcome).await;
    if !actions.is_empty() {
        device.invalidate(CollectionKind::VirtualServers);
    }
    applied.map(|()| outcome)
}

/// Delete a virtual server.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn delete_virtual_server(
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

    let Some(server) = device
        .virtual_servers()
        .await
        .during(KIND, name, "load virtual servers")?
        .find(name)
        .map(|vs| vs.name.clone())
    else {
        debug!(device = %device.hostname(), name, "Virtual server already absent");
        return Ok(outcome);
    };

    apply_actions(
        device,
        &[VirtualServerAction::Delete { name: server }],
        &mut outcome,
    )
    .await?;
    device.invalidate(CollectionKind::VirtualServers);
    Ok(outcome)
}
