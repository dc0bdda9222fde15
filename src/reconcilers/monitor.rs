// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Monitor template reconciliation.
//!
//! The device cannot change a template's parent (and therefore its type) in
//! place: a parent mismatch deletes and recreates the template. Deleting a
//! monitor still associated with a pool fails on the device, and that failure
//! is reported as-is.
//!
//! String properties are only valid for some monitor types. Every declared
//! property is checked against the type of the template as it exists on the
//! device before any attribute is changed.

use async_trait::async_trait;
use std::slice;
use std::time::Instant;
use tracing::{debug, warn};

use super::{apply_actions, finish, ReconcileOutcome, RemoteMutation, RemoteResultExt};
use crate::collections::Monitor;
use crate::device::LoadBalancer;
use crate::errors::{ContractError, ReconcileError, ResourceKind};
use crate::icontrol::types::{
    CommonAttributes, IntegerProperty, IntegerPropertyType, IpPort, MonitorIpPort,
    MonitorTemplate, StringProperty, StringPropertyType,
};
use crate::icontrol::{Remote, RemoteResult};
use crate::names::{folder_of, same_object, strip_folder};
use crate::partition::CollectionKind;
use crate::resources::MonitorSpec;

const KIND: ResourceKind = ResourceKind::Monitor;

/// Remote mutations on monitor templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MonitorAction {
    Create {
        template: MonitorTemplate,
        attributes: CommonAttributes,
    },
    Delete {
        name: String,
    },
    SetDestination {
        name: String,
        destination: MonitorIpPort,
    },
    SetInterval {
        name: String,
        seconds: u32,
    },
    SetTimeout {
        name: String,
        seconds: u32,
    },
    SetDescription {
        name: String,
        description: String,
    },
    SetStringProperty {
        name: String,
        property: StringPropertyType,
        value: String,
    },
}

impl MonitorAction {
    /// Merge an applied attribute change into a cached snapshot.
    fn merge_into(&self, monitor: &mut Monitor) {
        match self {
            Self::SetDestination { destination, .. } => monitor.destination = destination.clone(),
            Self::SetInterval { seconds, .. } => monitor.interval = *seconds,
            Self::SetTimeout { seconds, .. } => monitor.timeout = *seconds,
            Self::SetDescription { description, .. } => {
                monitor.description = description.clone();
            }
            Self::SetStringProperty {
                property, value, ..
            } => {
                monitor.user_values.insert(*property, value.clone());
            }
            Self::Create { .. } | Self::Delete { .. } => {}
        }
    }
}

#[async_trait]
impl RemoteMutation for MonitorAction {
    fn operation(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::SetDestination { .. } => "set destination",
            Self::SetInterval { .. } => "set interval",
            Self::SetTimeout { .. } => "set timeout",
            Self::SetDescription { .. } => "set description",
            Self::SetStringProperty { .. } => "set string property",
        }
    }

    async fn execute(&self, remote: &Remote) -> RemoteResult<()> {
        let api = &remote.monitors;
        match self {
            Self::Create {
                template,
                attributes,
            } => {
                api.create_template(slice::from_ref(template), slice::from_ref(attributes))
                    .await
            }
            Self::Delete { name } => api.delete_template(slice::from_ref(name)).await,
            Self::SetDestination { name, destination } => {
                api.set_template_destination(slice::from_ref(name), slice::from_ref(destination))
                    .await
            }
            Self::SetInterval { name, seconds } => {
                let value = IntegerProperty {
                    property_type: IntegerPropertyType::Interval,
                    value: *seconds,
                };
                api.set_integer_property(slice::from_ref(name), &[value])
                    .await
            }
            Self::SetTimeout { name, seconds } => {
                let value = IntegerProperty {
                    property_type: IntegerPropertyType::Timeout,
                    value: *seconds,
                };
                api.set_integer_property(slice::from_ref(name), &[value])
                    .await
            }
            Self::SetDescription { name, description } => {
                api.set_description(slice::from_ref(name), slice::from_ref(description))
                    .await
            }
            Self::SetStringProperty {
                name,
                property,
                value,
            } => {
                let value = StringProperty {
                    property_type: *property,
                    value: value.clone(),
                };
                api.set_string_property(slice::from_ref(name), &[value])
                    .await
            }
        }
    }
}

/// Whether `current` derives from the declared parent.
///
/// A bare declared parent ignores the folder of the current one.
pub(crate) fn parent_matches(current: &str, desired: &str) -> bool {
    if folder_of(desired).is_some() {
        current == desired
    } else {
        strip_folder(current) == desired
    }
}

fn desired_destination(desired: &MonitorSpec) -> MonitorIpPort {
    MonitorIpPort {
        address_type: desired.dest_addr_type,
        ipport: IpPort {
            address: desired.dest_addr_ip.clone(),
            port: desired.dest_addr_port,
        },
    }
}

/// Creation of a template; the device infers its type from the parent.
pub(crate) fn plan_create(desired: &MonitorSpec) -> MonitorAction {
    MonitorAction::Create {
        template: MonitorTemplate {
            template_name: desired.name.clone(),
            template_type: None,
        },
        attributes: CommonAttributes {
            parent_template: desired.parent.clone(),
            interval: desired.interval,
            timeout: desired.timeout,
            description: desired.description.clone(),
            dest_ipport: desired_destination(desired),
            is_read_only: false,
            is_directly_usable: true,
        },
    }
}

/// Attribute changes for a template whose parent already matches.
///
/// # Errors
///
/// Returns [`ContractError::StringPropertyNotAllowed`] if any declared string
/// property is invalid for the template's current type. No action is planned
/// in that case.
pub(crate) fn plan_monitor(
    current: &Monitor,
    desired: &MonitorSpec,
) -> Result<Vec<MonitorAction>, ContractError> {
    if let Some(property) = desired
        .user_values
        .keys()
        .find(|property| !property.allowed_for(current.monitor_type))
    {
        return Err(ContractError::StringPropertyNotAllowed {
            monitor: desired.name.clone(),
            property: property.to_string(),
            monitor_type: current.monitor_type.to_string(),
        });
    }

    let name = current.name.clone();
    let mut actions = Vec::new();

    let destination = desired_destination(desired);
    if current.destination.address_type != destination.address_type
        || !same_object(&current.destination.ipport.address, &destination.ipport.address)
        || current.destination.ipport.port != destination.ipport.port
    {
        actions.push(MonitorAction::SetDestination {
            name: name.clone(),
            destination,
        });
    }

    if current.interval != desired.interval {
        actions.push(MonitorAction::SetInterval {
            name: name.clone(),
            seconds: desired.interval,
        });
    }
    if current.timeout != desired.timeout {
        actions.push(MonitorAction::SetTimeout {
            name: name.clone(),
            seconds: desired.timeout,
        });
    }
    if current.description != desired.description {
        actions.push(MonitorAction::SetDescription {
            name: name.clone(),
            description: desired.description.clone(),
        });
    }

    for (property, value) in &desired.user_values {
        if current.user_values.get(property) != Some(value) {
            actions.push(MonitorAction::SetStringProperty {
                name: name.clone(),
                property: *property,
                value: value.clone(),
            });
        }
    }

    Ok(actions)
}

/// Converge a monitor template to its declaration.
///
/// # Errors
///
/// Returns a contract error for a string property the template's type does
/// not admit, or an error if a remote call fails or the template is missing
/// after creation.
pub async fn reconcile_monitor(
    device: &mut LoadBalancer,
    desired: &MonitorSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge(device, desired).await;
    finish(device, started, result)
}

async fn converge(
    device: &mut LoadBalancer,
    desired: &MonitorSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let name = desired.name.as_str();
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;

    let existing = device
        .monitors()
        .await
        .during(KIND, name, "load monitors")?
        .find(name)
        .map(|m| (m.name.clone(), m.parent.clone()));

    let mut present = existing.is_some();
    if let Some((current_name, current_parent)) = existing {
        if !parent_matches(&current_parent, &desired.parent) {
            warn!(
                device = %device.hostname(),
                name,
                current_parent = %current_parent,
                desired_parent = %desired.parent,
                "Parent template changed, recreating monitor"
            );
            let deleted = apply_actions(
                device,
                &[MonitorAction::Delete { name: current_name }],
                &mut outcome,
            )
            .await;
            device.invalidate(CollectionKind::Monitors);
            deleted?;
            present = false;
        }
    }
    if !present {
        let created = apply_actions(device, &[plan_create(desired)], &mut outcome).await;
        device.invalidate(CollectionKind::Monitors);
        created?;
    }

    let current = device
        .monitors()
        .await
        .during(KIND, name, "load monitors")?
        .find(name)
        .cloned()
        .ok_or_else(|| ReconcileError::MissingAfterCreate {
            kind: KIND,
            name: name.to_string(),
        })?;

    let actions =
        plan_monitor(&current, desired).map_err(|e| ReconcileError::contract(KIND, name, e))?;
    if let Err(e) = apply_actions(device, &actions, &mut outcome).await {
        // Some attributes may have landed before the failure
        device.invalidate(CollectionKind::Monitors);
        return Err(e);
    }

    if !actions.is_empty() {
        let cached = device
            .monitors_mut()
            .await
            .during(KIND, name, "load monitors")?
            .find_mut(name);
        if let Some(cached) = cached {
            for action in &actions {
                action.merge_into(cached);
            }
        }
    }

    Ok(outcome)
}

/// Delete a monitor template.
///
/// # Errors
///
/// Returns an error if a remote call fails, including when a pool still
/// uses the monitor.
pub async fn delete_monitor(
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

    let Some(monitor) = device
        .monitors()
        .await
        .during(KIND, name, "load monitors")?
        .find(name)
        .map(|m| m.name.clone())
    else {
        debug!(device = %device.hostname(), name, "Monitor already absent");
        return Ok(outcome);
    };

    let deleted =
        apply_actions(device, &[MonitorAction::Delete { name: monitor }], &mut outcome).await;
    device.invalidate(CollectionKind::Monitors);
    deleted.map(|()| outcome)
}
