// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed service traits, one per object family.
//!
//! Every bulk operation takes arrays aligned by position and returns arrays in
//! the same order as the names it was given.

use async_trait::async_trait;

use super::types::{
    AddressClass, CommonAttributes, EnabledState, FailoverState, IntegerProperty,
    IntegerPropertyType, IpPort, LbMethod, ManagementMode, MemberAddress, MonitorAssociation,
    MonitorIpPort, MonitorTemplate, ObjectStatus, PersistenceProfile, ProfileAttribute, Protocol,
    ResourceType, RuleAssignment, RuleDefinition, SnatType, StringClass, StringProperty,
    StringPropertyType, VirtualServerDefinition, VirtualServerResource, VlanFilter,
};
use crate::errors::RemoteError;

/// Result type for every remote call.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Node addresses.
#[async_trait]
pub trait NodeService: Send + Sync {
    async fn create(
        &self,
        names: &[String],
        addresses: &[String],
        connection_limits: &[u32],
    ) -> RemoteResult<()>;
    async fn delete(&self, names: &[String]) -> RemoteResult<()>;
    async fn list(&self) -> RemoteResult<Vec<String>>;
    async fn get_address(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn get_object_status(&self, names: &[String]) -> RemoteResult<Vec<ObjectStatus>>;
    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_enabled_state(&self, names: &[String], states: &[EnabledState])
        -> RemoteResult<()>;
    async fn set_description(&self, names: &[String], descriptions: &[String])
        -> RemoteResult<()>;
}

/// Pools, their members and monitor associations.
#[async_trait]
pub trait PoolService: Send + Sync {
    async fn create(
        &self,
        names: &[String],
        lb_methods: &[LbMethod],
        members: &[Vec<MemberAddress>],
    ) -> RemoteResult<()>;
    async fn delete(&self, names: &[String]) -> RemoteResult<()>;
    async fn list(&self) -> RemoteResult<Vec<String>>;
    async fn get_members(&self, names: &[String]) -> RemoteResult<Vec<Vec<MemberAddress>>>;
    async fn add_members(&self, names: &[String], members: &[Vec<MemberAddress>])
        -> RemoteResult<()>;
    async fn remove_members(
        &self,
        names: &[String],
        members: &[Vec<MemberAddress>],
    ) -> RemoteResult<()>;
    async fn get_lb_method(&self, names: &[String]) -> RemoteResult<Vec<LbMethod>>;
    async fn set_lb_method(&self, names: &[String], methods: &[LbMethod]) -> RemoteResult<()>;
    async fn get_monitor_association(
        &self,
        names: &[String],
    ) -> RemoteResult<Vec<MonitorAssociation>>;
    async fn set_monitor_association(&self, associations: &[MonitorAssociation])
        -> RemoteResult<()>;
    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_description(&self, names: &[String], descriptions: &[String])
        -> RemoteResult<()>;
}

/// Virtual servers.
#[async_trait]
pub trait VirtualServerService: Send + Sync {
    async fn create(
        &self,
        definitions: &[VirtualServerDefinition],
        wildmasks: &[String],
        resources: &[VirtualServerResource],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()>;
    async fn delete(&self, names: &[String]) -> RemoteResult<()>;
    async fn list(&self) -> RemoteResult<Vec<String>>;

    async fn get_destination(&self, names: &[String]) -> RemoteResult<Vec<IpPort>>;
    async fn set_destination(&self, names: &[String], destinations: &[IpPort])
        -> RemoteResult<()>;
    async fn get_wildmask(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_wildmask(&self, names: &[String], wildmasks: &[String]) -> RemoteResult<()>;
    async fn get_type(&self, names: &[String]) -> RemoteResult<Vec<ResourceType>>;
    async fn get_protocol(&self, names: &[String]) -> RemoteResult<Vec<Protocol>>;
    async fn get_default_pool(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_default_pool(&self, names: &[String], pools: &[String]) -> RemoteResult<()>;
    async fn get_object_status(&self, names: &[String]) -> RemoteResult<Vec<ObjectStatus>>;
    async fn set_enabled_state(&self, names: &[String], states: &[EnabledState])
        -> RemoteResult<()>;
    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_description(&self, names: &[String], descriptions: &[String])
        -> RemoteResult<()>;
    async fn get_source_address(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_source_address(&self, names: &[String], addresses: &[String])
        -> RemoteResult<()>;
    async fn get_translate_address(&self, names: &[String]) -> RemoteResult<Vec<EnabledState>>;
    async fn set_translate_address(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()>;
    async fn get_translate_port(&self, names: &[String]) -> RemoteResult<Vec<EnabledState>>;
    async fn set_translate_port(&self, names: &[String], states: &[EnabledState])
        -> RemoteResult<()>;

    async fn get_profile(&self, names: &[String]) -> RemoteResult<Vec<Vec<ProfileAttribute>>>;
    async fn add_profile(
        &self,
        names: &[String],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()>;
    async fn remove_profile(
        &self,
        names: &[String],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()>;

    async fn get_vlan(&self, names: &[String]) -> RemoteResult<Vec<VlanFilter>>;
    async fn set_vlan(&self, names: &[String], vlans: &[VlanFilter]) -> RemoteResult<()>;

    async fn get_snat_type(&self, names: &[String]) -> RemoteResult<Vec<SnatType>>;
    async fn get_snat_pool(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_snat_none(&self, names: &[String]) -> RemoteResult<()>;
    async fn set_snat_automap(&self, names: &[String]) -> RemoteResult<()>;
    async fn set_snat_pool(&self, names: &[String], pools: &[String]) -> RemoteResult<()>;

    async fn get_persistence_profile(
        &self,
        names: &[String],
    ) -> RemoteResult<Vec<Vec<PersistenceProfile>>>;
    async fn add_persistence_profile(
        &self,
        names: &[String],
        profiles: &[Vec<PersistenceProfile>],
    ) -> RemoteResult<()>;
    async fn remove_all_persistence_profiles(&self, names: &[String]) -> RemoteResult<()>;
    async fn get_fallback_persistence_profile(&self, names: &[String])
        -> RemoteResult<Vec<String>>;
    async fn set_fallback_persistence_profile(
        &self,
        names: &[String],
        profiles: &[String],
    ) -> RemoteResult<()>;

    async fn get_rules(&self, names: &[String]) -> RemoteResult<Vec<Vec<RuleAssignment>>>;
    async fn add_rules(&self, names: &[String], rules: &[Vec<RuleAssignment>]) -> RemoteResult<()>;
    async fn remove_all_rules(&self, names: &[String]) -> RemoteResult<()>;
}

/// Monitor templates.
#[async_trait]
pub trait MonitorService: Send + Sync {
    async fn create_template(
        &self,
        templates: &[MonitorTemplate],
        attributes: &[CommonAttributes],
    ) -> RemoteResult<()>;
    async fn delete_template(&self, names: &[String]) -> RemoteResult<()>;
    async fn get_template_list(&self) -> RemoteResult<Vec<MonitorTemplate>>;
    async fn is_template_root(&self, names: &[String]) -> RemoteResult<Vec<bool>>;
    async fn get_parent_template(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn get_template_destination(&self, names: &[String])
        -> RemoteResult<Vec<MonitorIpPort>>;
    async fn set_template_destination(
        &self,
        names: &[String],
        destinations: &[MonitorIpPort],
    ) -> RemoteResult<()>;
    async fn get_integer_property(
        &self,
        names: &[String],
        property_types: &[IntegerPropertyType],
    ) -> RemoteResult<Vec<IntegerProperty>>;
    async fn set_integer_property(
        &self,
        names: &[String],
        values: &[IntegerProperty],
    ) -> RemoteResult<()>;
    async fn get_string_property(
        &self,
        names: &[String],
        property_types: &[StringPropertyType],
    ) -> RemoteResult<Vec<StringProperty>>;
    async fn set_string_property(&self, names: &[String], values: &[StringProperty])
        -> RemoteResult<()>;
    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>>;
    async fn set_description(&self, names: &[String], descriptions: &[String])
        -> RemoteResult<()>;
}

/// Address and string data classes.
#[async_trait]
pub trait ClassService: Send + Sync {
    async fn get_address_class(&self, names: &[String]) -> RemoteResult<Vec<AddressClass>>;
    async fn create_address_class(&self, classes: &[AddressClass]) -> RemoteResult<()>;
    async fn modify_address_class(&self, classes: &[AddressClass]) -> RemoteResult<()>;
    async fn get_address_class_member_data_value(
        &self,
        classes: &[AddressClass],
    ) -> RemoteResult<Vec<Vec<String>>>;
    async fn set_address_class_member_data_value(
        &self,
        classes: &[AddressClass],
        values: &[Vec<String>],
    ) -> RemoteResult<()>;

    async fn get_string_class(&self, names: &[String]) -> RemoteResult<Vec<StringClass>>;
    async fn create_string_class(&self, classes: &[StringClass]) -> RemoteResult<()>;
    async fn modify_string_class(&self, classes: &[StringClass]) -> RemoteResult<()>;
    async fn get_string_class_member_data_value(
        &self,
        classes: &[StringClass],
    ) -> RemoteResult<Vec<Vec<String>>>;
    async fn set_string_class_member_data_value(
        &self,
        classes: &[StringClass],
        values: &[Vec<String>],
    ) -> RemoteResult<()>;

    async fn delete_class(&self, names: &[String]) -> RemoteResult<()>;
}

/// iRules.
#[async_trait]
pub trait RuleService: Send + Sync {
    async fn create(&self, rules: &[RuleDefinition]) -> RemoteResult<()>;
    async fn modify(&self, rules: &[RuleDefinition]) -> RemoteResult<()>;
    async fn delete(&self, names: &[String]) -> RemoteResult<()>;
    async fn list(&self) -> RemoteResult<Vec<String>>;
    /// Rules with empty content are omitted from the result.
    async fn query(&self, names: &[String]) -> RemoteResult<Vec<RuleDefinition>>;
}

/// SSL certificates and keys.
#[async_trait]
pub trait KeyCertificateService: Send + Sync {
    async fn get_certificate_list(&self, mode: ManagementMode) -> RemoteResult<Vec<String>>;
    async fn get_key_list(&self, mode: ManagementMode) -> RemoteResult<Vec<String>>;
    async fn certificate_import_from_pem(
        &self,
        mode: ManagementMode,
        ids: &[String],
        pems: &[String],
        overwrite: bool,
    ) -> RemoteResult<()>;
    async fn key_import_from_pem(
        &self,
        mode: ManagementMode,
        ids: &[String],
        pems: &[String],
        overwrite: bool,
    ) -> RemoteResult<()>;
    async fn certificate_delete(&self, mode: ManagementMode, ids: &[String]) -> RemoteResult<()>;
    async fn key_delete(&self, mode: ManagementMode, ids: &[String]) -> RemoteResult<()>;
}

/// Config-sync to device-group peers.
#[async_trait]
pub trait ConfigSyncService: Send + Sync {
    async fn synchronize_to_group(&self, group: &str, device: &str, force: bool)
        -> RemoteResult<()>;
}

/// Session state: the active folder.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn get_active_folder(&self) -> RemoteResult<String>;
    async fn set_active_folder(&self, folder: &str) -> RemoteResult<()>;
    async fn get_partition_list(&self) -> RemoteResult<Vec<String>>;
}

/// High-availability state.
#[async_trait]
pub trait FailoverService: Send + Sync {
    async fn get_failover_state(&self) -> RemoteResult<FailoverState>;
}

/// Device groups.
#[async_trait]
pub trait DeviceGroupService: Send + Sync {
    async fn get_list(&self) -> RemoteResult<Vec<String>>;
}

/// System network identity.
#[async_trait]
pub trait InetService: Send + Sync {
    async fn get_hostname(&self) -> RemoteResult<String>;
}
