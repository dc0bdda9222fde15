// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Virtual server snapshot.
//!
//! A virtual server carries more independently managed attributes than any
//! other object, so loading one issues a getter per attribute. Rules are
//! reported with priorities and are kept here as names in ascending priority
//! order.

use tracing::debug;

use super::zip_into;
use crate::constants::IFACE_VIRTUAL_SERVER;
use crate::errors::RemoteError;
use crate::icontrol::types::{
    EnabledState, IpPort, PersistenceProfile, ProfileAttribute, Protocol, ResourceType, SnatType,
    VlanFilter,
};
use crate::icontrol::Remote;
use crate::names::matches_name;

/// A virtual server as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualServer {
    pub name: String,
    pub destination: IpPort,
    pub wildmask: String,
    pub resource_type: ResourceType,
    pub protocol: Protocol,
    pub default_pool: String,
    pub enabled: bool,
    pub description: String,
    pub source_address: String,
    pub translate_address: EnabledState,
    pub translate_port: EnabledState,
    pub profiles: Vec<ProfileAttribute>,
    pub vlans: VlanFilter,
    pub snat_type: SnatType,
    pub snat_pool: String,
    /// Default persistence profiles; more than one is an inconsistency to repair
    pub persistence: Vec<PersistenceProfile>,
    pub fallback_persistence: String,
    /// iRule names ordered by ascending priority
    pub rules: Vec<String>,
}

impl VirtualServer {
    fn named(name: String) -> Self {
        Self {
            name,
            destination: IpPort {
                address: String::new(),
                port: 0,
            },
            wildmask: String::new(),
            resource_type: ResourceType::default(),
            protocol: Protocol::default(),
            default_pool: String::new(),
            enabled: true,
            description: String::new(),
            source_address: String::new(),
            translate_address: EnabledState::Enabled,
            translate_port: EnabledState::Enabled,
            profiles: Vec::new(),
            vlans: VlanFilter {
                state: EnabledState::Disabled,
                vlans: Vec::new(),
            },
            snat_type: SnatType::default(),
            snat_pool: String::new(),
            persistence: Vec::new(),
            fallback_persistence: String::new(),
            rules: Vec::new(),
        }
    }

    /// Name of the first default persistence profile, or empty when none.
    #[must_use]
    pub fn default_persistence(&self) -> &str {
        self.persistence
            .first()
            .map_or("", |profile| profile.profile_name.as_str())
    }
}

/// Every virtual server visible from the active folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualServerCollection {
    servers: Vec<VirtualServer>,
}

impl VirtualServerCollection {
    /// Load every virtual server with all managed attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if any bulk call fails or returns a misaligned result.
    pub async fn load(remote: &Remote) -> Result<Self, RemoteError> {
        let api = &remote.virtual_servers;
        let names = api.list().await?;
        let mut servers: Vec<VirtualServer> =
            names.iter().cloned().map(VirtualServer::named).collect();

        if servers.is_empty() {
            debug!(count = 0, "Loaded virtual servers");
            return Ok(Self { servers });
        }

        let iface = IFACE_VIRTUAL_SERVER;
        let list = &mut servers;

        zip_into(list, api.get_destination(&names).await?, iface, "get_destination_v2", |vs, v| {
            vs.destination = v;
        })?;
        zip_into(list, api.get_wildmask(&names).await?, iface, "get_wildmask", |vs, v| {
            vs.wildmask = v;
        })?;
        zip_into(list, api.get_type(&names).await?, iface, "get_type", |vs, v| {
            vs.resource_type = v;
        })?;
        zip_into(list, api.get_protocol(&names).await?, iface, "get_protocol", |vs, v| {
            vs.protocol = v;
        })?;
        zip_into(list, api.get_default_pool(&names).await?, iface, "get_default_pool_name", |vs, v| {
            vs.default_pool = v;
        })?;
        zip_into(list, api.get_object_status(&names).await?, iface, "get_object_status", |vs, v| {
            vs.enabled = v.is_enabled();
        })?;
        zip_into(list, api.get_description(&names).await?, iface, "get_description", |vs, v| {
            vs.description = v;
        })?;
        zip_into(list, api.get_source_address(&names).await?, iface, "get_source_address", |vs, v| {
            vs.source_address = v;
        })?;
        zip_into(
            list,
            api.get_translate_address(&names).await?,
            iface,
            "get_translate_address_state",
            |vs, v| vs.translate_address = v,
        )?;
        zip_into(
            list,
            api.get_translate_port(&names).await?,
            iface,
            "get_translate_port_state",
            |vs, v| vs.translate_port = v,
        )?;
        zip_into(list, api.get_profile(&names).await?, iface, "get_profile", |vs, v| {
            vs.profiles = v;
        })?;
        zip_into(list, api.get_vlan(&names).await?, iface, "get_vlan", |vs, v| {
            vs.vlans = v;
        })?;
        zip_into(
            list,
            api.get_snat_type(&names).await?,
            iface,
            "get_source_address_translation_type",
            |vs, v| vs.snat_type = v,
        )?;
        zip_into(
            list,
            api.get_snat_pool(&names).await?,
            iface,
            "get_source_address_translation_snat_pool",
            |vs, v| vs.snat_pool = v,
        )?;
        zip_into(
            list,
            api.get_persistence_profile(&names).await?,
            iface,
            "get_persistence_profile",
            |vs, v| vs.persistence = v,
        )?;
        zip_into(
            list,
            api.get_fallback_persistence_profile(&names).await?,
            iface,
            "get_fallback_persistence_profile",
            |vs, v| vs.fallback_persistence = v,
        )?;
        zip_into(list, api.get_rules(&names).await?, iface, "get_rule", |vs, mut rules| {
            rules.sort_by_key(|rule| rule.priority);
            vs.rules = rules.into_iter().map(|rule| rule.rule_name).collect();
        })?;

        debug!(count = servers.len(), "Loaded virtual servers");
        Ok(Self { servers })
    }

    /// Virtual server whose name matches `name`, exactly or as a folder-qualified suffix.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&VirtualServer> {
        self.servers.iter().find(|vs| matches_name(&vs.name, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualServer> {
        self.servers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
