// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Monitor template snapshot.
//!
//! Root (system) templates are dropped before any attribute is fetched; they
//! can neither be created nor modified and never participate in reconciliation.
//! String properties are only requested for templates whose type admits them.

use std::collections::BTreeMap;
use tracing::debug;

use super::zip_into;
use crate::constants::IFACE_MONITOR;
use crate::errors::RemoteError;
use crate::icontrol::types::{
    AddressType, IntegerPropertyType, IpPort, MonitorIpPort, MonitorType, StringPropertyType,
};
use crate::icontrol::Remote;
use crate::names::matches_name;

/// A user-defined monitor template as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub name: String,
    pub monitor_type: MonitorType,
    pub parent: String,
    pub interval: u32,
    pub timeout: u32,
    pub description: String,
    pub destination: MonitorIpPort,
    /// String properties valid for this monitor's type
    pub user_values: BTreeMap<StringPropertyType, String>,
}

impl Monitor {
    fn new(name: String, monitor_type: MonitorType) -> Self {
        Self {
            name,
            monitor_type,
            parent: String::new(),
            interval: 0,
            timeout: 0,
            description: String::new(),
            destination: MonitorIpPort {
                address_type: AddressType::Unset,
                ipport: IpPort {
                    address: String::new(),
                    port: 0,
                },
            },
            user_values: BTreeMap::new(),
        }
    }
}

/// Every non-root monitor template visible from the active folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorCollection {
    monitors: Vec<Monitor>,
}

impl MonitorCollection {
    /// Load every non-root template with its attributes and string properties.
    ///
    /// # Errors
    ///
    /// Returns an error if any bulk call fails or returns a misaligned result.
    pub async fn load(remote: &Remote) -> Result<Self, RemoteError> {
        let api = &remote.monitors;
        let templates = api.get_template_list().await?;
        if templates.is_empty() {
            return Ok(Self::default());
        }

        let all_names: Vec<String> = templates.iter().map(|t| t.template_name.clone()).collect();
        let roots = api.is_template_root(&all_names).await?;
        if roots.len() != templates.len() {
            return Err(RemoteError::LengthMismatch {
                interface: IFACE_MONITOR,
                method: "is_template_root",
                expected: templates.len(),
                actual: roots.len(),
            });
        }

        let mut monitors: Vec<Monitor> = templates
            .into_iter()
            .zip(roots)
            .filter(|(_, is_root)| !is_root)
            .map(|(template, _)| {
                Monitor::new(
                    template.template_name,
                    template.template_type.unwrap_or(MonitorType::Unset),
                )
            })
            .collect();

        if monitors.is_empty() {
            debug!(count = 0, "Loaded monitors");
            return Ok(Self { monitors });
        }

        let names: Vec<String> = monitors.iter().map(|m| m.name.clone()).collect();
        let iface = IFACE_MONITOR;

        let parents = api.get_parent_template(&names).await?;
        zip_into(&mut monitors, parents, iface, "get_parent_template", |m, v| {
            m.parent = v;
        })?;

        let destinations = api.get_template_destination(&names).await?;
        zip_into(&mut monitors, destinations, iface, "get_template_destination", |m, v| {
            m.destination = v;
        })?;

        let intervals = api
            .get_integer_property(&names, &vec![IntegerPropertyType::Interval; names.len()])
            .await?;
        zip_into(&mut monitors, intervals, iface, "get_template_integer_property", |m, v| {
            m.interval = v.value;
        })?;

        let timeouts = api
            .get_integer_property(&names, &vec![IntegerPropertyType::Timeout; names.len()])
            .await?;
        zip_into(&mut monitors, timeouts, iface, "get_template_integer_property", |m, v| {
            m.timeout = v.value;
        })?;

        let descriptions = api.get_description(&names).await?;
        zip_into(&mut monitors, descriptions, iface, "get_description", |m, v| {
            m.description = v;
        })?;

        for property in StringPropertyType::ALL.iter().copied() {
            let targets: Vec<usize> = monitors
                .iter()
                .enumerate()
                .filter(|(_, m)| property.allowed_for(m.monitor_type))
                .map(|(idx, _)| idx)
                .collect();
            if targets.is_empty() {
                continue;
            }

            let target_names: Vec<String> =
                targets.iter().map(|&idx| monitors[idx].name.clone()).collect();
            let values = api
                .get_string_property(&target_names, &vec![property; target_names.len()])
                .await?;
            if values.len() != targets.len() {
                return Err(RemoteError::LengthMismatch {
                    interface: iface,
                    method: "get_template_string_property",
                    expected: targets.len(),
                    actual: values.len(),
                });
            }
            for (idx, value) in targets.into_iter().zip(values) {
                monitors[idx].user_values.insert(property, value.value);
            }
        }

        debug!(count = monitors.len(), "Loaded monitors");
        Ok(Self { monitors })
    }

    /// Monitor whose name matches `name`, exactly or as a folder-qualified suffix.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| matches_name(&m.name, name))
    }

    /// Mutable access for merging applied changes into the cached snapshot.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Monitor> {
        self.monitors.iter_mut().find(|m| matches_name(&m.name, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}
