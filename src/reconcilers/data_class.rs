// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Address and string data class reconciliation.
//!
//! A data class is stored as two parallel arrays: member keys and their values.
//! The device has no existence flag for classes, so a class without members is
//! treated as absent, and an empty declaration plans nothing. Any difference
//! in keys or values replaces the whole class: the member list is modified
//! (or created), then every value is set, index-aligned with the submitted
//! members.

use async_trait::async_trait;
use std::net::IpAddr;
use std::slice;
use std::time::Instant;
use tracing::debug;

use super::{apply_actions, finish, ReconcileOutcome, RemoteMutation, RemoteResultExt};
use crate::constants::HOST_NETMASK;
use crate::device::LoadBalancer;
use crate::errors::{ContractError, ReconcileError, ResourceKind};
use crate::icontrol::types::{AddressClass, AddressEntry, StringClass};
use crate::icontrol::{Remote, RemoteResult};
use crate::names::strip_folder;
use crate::resources::DataClassSpec;

/// Remote mutations on data classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClassAction {
    CreateAddress {
        class: AddressClass,
    },
    ModifyAddress {
        class: AddressClass,
    },
    SetAddressValues {
        class: AddressClass,
        values: Vec<String>,
    },
    CreateString {
        class: StringClass,
    },
    ModifyString {
        class: StringClass,
    },
    SetStringValues {
        class: StringClass,
        values: Vec<String>,
    },
    Delete {
        name: String,
    },
}

#[async_trait]
impl RemoteMutation for ClassAction {
    fn operation(&self) -> &'static str {
        match self {
            Self::CreateAddress { .. } | Self::CreateString { .. } => "create",
            Self::ModifyAddress { .. } | Self::ModifyString { .. } => "modify",
            Self::SetAddressValues { .. } | Self::SetStringValues { .. } => "set values",
            Self::Delete { .. } => "delete",
        }
    }

    async fn execute(&self, remote: &Remote) -> RemoteResult<()> {
        let api = &remote.classes;
        match self {
            Self::CreateAddress { class } => api.create_address_class(slice::from_ref(class)).await,
            Self::ModifyAddress { class } => api.modify_address_class(slice::from_ref(class)).await,
            Self::SetAddressValues { class, values } => {
                api.set_address_class_member_data_value(
                    slice::from_ref(class),
                    slice::from_ref(values),
                )
                .await
            }
            Self::CreateString { class } => api.create_string_class(slice::from_ref(class)).await,
            Self::ModifyString { class } => api.modify_string_class(slice::from_ref(class)).await,
            Self::SetStringValues { class, values } => {
                api.set_string_class_member_data_value(
                    slice::from_ref(class),
                    slice::from_ref(values),
                )
                .await
            }
            Self::Delete { name } => api.delete_class(slice::from_ref(name)).await,
        }
    }
}

/// Members and values to submit when a class has to be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClassReplacement<K> {
    /// Whether the class exists and is modified rather than created
    pub modify: bool,
    pub members: Vec<K>,
    /// Values index-aligned with `members`
    pub values: Vec<String>,
}

fn sorted<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort();
    items
}

/// Replacement needed to converge a class, or `None` when keys and values
/// already match.
///
/// `current` is `None` for a class that does not exist. An empty
/// declaration is already satisfied by an absent class, since the device
/// reports both the same way.
pub(crate) fn plan_replacement<K: Ord + Clone>(
    current: Option<(&[K], &[String])>,
    desired: Vec<(K, String)>,
) -> Option<ClassReplacement<K>> {
    let (members, values): (Vec<K>, Vec<String>) = desired.into_iter().unzip();

    match current {
        None if members.is_empty() => None,
        None => Some(ClassReplacement {
            modify: false,
            members,
            values,
        }),
        Some((current_members, current_values)) => {
            let keys_differ = sorted(current_members) != sorted(&members);
            let values_differ = sorted(current_values) != sorted(&values);
            (keys_differ || values_differ).then_some(ClassReplacement {
                modify: true,
                members,
                values,
            })
        }
    }
}

/// Parse an address class key: `address` or `address/netmask`.
///
/// # Errors
///
/// Returns [`ContractError::InvalidClassKey`] if either part is not an IP
/// address.
pub(crate) fn parse_address_key(class: &str, key: &str) -> Result<AddressEntry, ContractError> {
    let invalid = || ContractError::InvalidClassKey {
        class: class.to_string(),
        key: key.to_string(),
    };
    let (address, netmask) = key.split_once('/').unwrap_or((key, HOST_NETMASK));
    let address: IpAddr = address.trim().parse().map_err(|_| invalid())?;
    let netmask: IpAddr = netmask.trim().parse().map_err(|_| invalid())?;
    Ok(AddressEntry {
        address: address.to_string(),
        netmask: netmask.to_string(),
    })
}

/// Parse every key of an address class, folding keys that name the same
/// entry (`10.0.0.1` and `10.0.0.1/255.255.255.255`) into one member.
///
/// # Errors
///
/// Returns a contract error for an invalid key, or for two keys naming the
/// same entry with different values.
pub(crate) fn address_records(
    desired: &DataClassSpec,
) -> Result<Vec<(AddressEntry, String)>, ContractError> {
    let mut records: Vec<(AddressEntry, String)> = Vec::with_capacity(desired.records.len());
    for (key, value) in &desired.records {
        let entry = parse_address_key(&desired.name, key)?;
        match records.iter().find(|(seen, _)| *seen == entry) {
            None => records.push((entry, value.clone())),
            Some((_, seen)) if seen == value => {}
            Some(_) => {
                return Err(ContractError::InvalidDeclaration {
                    resource: desired.name.clone(),
                    reason: format!(
                        "key '{key}' repeats {}/{} with a different value",
                        entry.address, entry.netmask
                    ),
                })
            }
        }
    }
    Ok(records)
}

/// Converge an address class to its declaration.
///
/// # Errors
///
/// Returns a contract error for a key that is not an address, or an error if
/// a remote call fails.
pub async fn reconcile_address_class(
    device: &mut LoadBalancer,
    desired: &DataClassSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge_address(device, desired).await;
    finish(device, started, result)
}

async fn converge_address(
    device: &mut LoadBalancer,
    desired: &DataClassSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    const KIND: ResourceKind = ResourceKind::AddressClass;
    let name = desired.name.as_str();
    let mut outcome = ReconcileOutcome::new(KIND, name);

    let records = address_records(desired).map_err(|e| ReconcileError::contract(KIND, name, e))?;

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;
    let bare = strip_folder(name).to_string();

    let api = &device.remote().classes;
    let current = api
        .get_address_class(slice::from_ref(&bare))
        .await
        .during(KIND, name, "get class")?
        .into_iter()
        .next()
        .filter(|class| !class.members.is_empty());
    let current_values = match &current {
        Some(class) => api
            .get_address_class_member_data_value(slice::from_ref(class))
            .await
            .during(KIND, name, "get values")?
            .into_iter()
            .next()
            .unwrap_or_default(),
        None => Vec::new(),
    };

    let replacement = plan_replacement(
        current
            .as_ref()
            .map(|class| (class.members.as_slice(), current_values.as_slice())),
        records,
    );
    if let Some(replacement) = replacement {
        let class = AddressClass {
            name: bare,
            members: replacement.members,
        };
        let replace = if replacement.modify {
            ClassAction::ModifyAddress {
                class: class.clone(),
            }
        } else {
            ClassAction::CreateAddress {
                class: class.clone(),
            }
        };
        let set_values = ClassAction::SetAddressValues {
            class,
            values: replacement.values,
        };
        apply_actions(device, &[replace, set_values], &mut outcome).await?;
    }

    Ok(outcome)
}

/// Converge a string class to its declaration.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn reconcile_string_class(
    device: &mut LoadBalancer,
    desired: &DataClassSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge_string(device, desired).await;
    finish(device, started, result)
}

async fn converge_string(
    device: &mut LoadBalancer,
    desired: &DataClassSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    const KIND: ResourceKind = ResourceKind::StringClass;
    let name = desired.name.as_str();
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;
    let bare = strip_folder(name).to_string();

    let api = &device.remote().classes;
    let current = api
        .get_string_class(slice::from_ref(&bare))
        .await
        .during(KIND, name, "get class")?
        .into_iter()
        .next()
        .filter(|class| !class.members.is_empty());
    let current_values = match &current {
        Some(class) => api
            .get_string_class_member_data_value(slice::from_ref(class))
            .await
            .during(KIND, name, "get values")?
            .into_iter()
            .next()
            .unwrap_or_default(),
        None => Vec::new(),
    };

    let records = desired
        .records
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let replacement = plan_replacement(
        current
            .as_ref()
            .map(|class| (class.members.as_slice(), current_values.as_slice())),
        records,
    );
    if let Some(replacement) = replacement {
        let class = StringClass {
            name: bare,
            members: replacement.members,
        };
        let replace = if replacement.modify {
            ClassAction::ModifyString {
                class: class.clone(),
            }
        } else {
            ClassAction::CreateString {
                class: class.clone(),
            }
        };
        let set_values = ClassAction::SetStringValues {
            class,
            values: replacement.values,
        };
        apply_actions(device, &[replace, set_values], &mut outcome).await?;
    }

    Ok(outcome)
}

/// Delete an address class.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn delete_address_class(
    device: &mut LoadBalancer,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = remove(device, ResourceKind::AddressClass, name).await;
    finish(device, started, result)
}

/// Delete a string class.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn delete_string_class(
    device: &mut LoadBalancer,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = remove(device, ResourceKind::StringClass, name).await;
    finish(device, started, result)
}

async fn remove(
    device: &mut LoadBalancer,
    kind: ResourceKind,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut outcome = ReconcileOutcome::new(kind, name);

    device
        .change_folder_for(name)
        .await
        .during(kind, name, "change folder")?;
    let bare = strip_folder(name).to_string();

    let api = &device.remote().classes;
    let names = slice::from_ref(&bare);
    let exists = if kind == ResourceKind::AddressClass {
        api.get_address_class(names)
            .await
            .during(kind, name, "get class")?
            .iter()
            .any(|class| !class.members.is_empty())
    } else {
        api.get_string_class(names)
            .await
            .during(kind, name, "get class")?
            .iter()
            .any(|class| !class.members.is_empty())
    };
    if !exists {
        debug!(device = %device.hostname(), kind = %kind, name, "Class already absent");
        return Ok(outcome);
    }

    apply_actions(device, &[ClassAction::Delete { name: bare }], &mut outcome).await?;
    Ok(outcome)
}
