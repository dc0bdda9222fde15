// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service trait implementations for [`RpcClient`].
//!
//! Each method maps onto one device RPC; parameter names follow the device's
//! own argument names so the JSON body can be forwarded without translation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::services::{
    ClassService, ConfigSyncService, DeviceGroupService, FailoverService, InetService,
    KeyCertificateService, MonitorService, NodeService, PoolService, RemoteResult, RuleService,
    SessionService, VirtualServerService,
};
use super::transport::RpcClient;
use super::types::{
    AddressClass, CommonAttributes, EnabledState, FailoverState, IntegerProperty,
    IntegerPropertyType, IpPort, LbMethod, ManagementMode, MemberAddress, MonitorAssociation,
    MonitorIpPort, MonitorTemplate, ObjectStatus, PersistenceProfile, ProfileAttribute, Protocol,
    ResourceType, RuleAssignment, RuleDefinition, SnatType, StringClass, StringProperty,
    StringPropertyType, VirtualServerDefinition, VirtualServerResource, VlanFilter,
};
use crate::constants::{
    IFACE_CLASS, IFACE_CONFIG_SYNC, IFACE_DEVICE_GROUP, IFACE_FAILOVER, IFACE_INET,
    IFACE_KEY_CERTIFICATE, IFACE_MONITOR, IFACE_NODE, IFACE_PARTITION, IFACE_POOL, IFACE_RULE,
    IFACE_SESSION, IFACE_VIRTUAL_SERVER,
};

#[derive(Deserialize)]
struct PartitionEntry {
    partition_name: String,
}

#[async_trait]
impl NodeService for RpcClient {
    async fn create(
        &self,
        names: &[String],
        addresses: &[String],
        connection_limits: &[u32],
    ) -> RemoteResult<()> {
        let params = json!({ "nodes": names, "addresses": addresses, "limits": connection_limits });
        self.invoke(IFACE_NODE, "create", &params).await
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        self.invoke(IFACE_NODE, "delete_node_address", &json!({ "nodes": names }))
            .await
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        self.call(IFACE_NODE, "get_list", &json!({})).await
    }

    async fn get_address(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        self.call(IFACE_NODE, "get_address", &json!({ "nodes": names }))
            .await
    }

    async fn get_object_status(&self, names: &[String]) -> RemoteResult<Vec<ObjectStatus>> {
        self.call(IFACE_NODE, "get_object_status", &json!({ "nodes": names }))
            .await
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        self.call(IFACE_NODE, "get_description", &json!({ "nodes": names }))
            .await
    }

    async fn set_enabled_state(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        let params = json!({ "nodes": names, "states": states });
        self.invoke(IFACE_NODE, "set_session_enabled_state", &params)
            .await
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        let params = json!({ "nodes": names, "descriptions": descriptions });
        self.invoke(IFACE_NODE, "set_description", &params).await
    }
}

#[async_trait]
impl PoolService for RpcClient {
    async fn create(
        &self,
        names: &[String],
        lb_methods: &[LbMethod],
        members: &[Vec<MemberAddress>],
    ) -> RemoteResult<()> {
        let params = json!({ "pool_names": names, "lb_methods": lb_methods, "members": members });
        self.invoke(IFACE_POOL, "create_v2", &params).await
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        self.invoke(IFACE_POOL, "delete_pool", &json!({ "pool_names": names }))
            .await
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        self.call(IFACE_POOL, "get_list", &json!({})).await
    }

    async fn get_members(&self, names: &[String]) -> RemoteResult<Vec<Vec<MemberAddress>>> {
        self.call(IFACE_POOL, "get_member_v2", &json!({ "pool_names": names }))
            .await
    }

    async fn add_members(&self, names: &[String], members: &[Vec<MemberAddress>]) -> RemoteResult<()> {
        let params = json!({ "pool_names": names, "members": members });
        self.invoke(IFACE_POOL, "add_member_v2", &params).await
    }

    async fn remove_members(
        &self,
        names: &[String],
        members: &[Vec<MemberAddress>],
    ) -> RemoteResult<()> {
        let params = json!({ "pool_names": names, "members": members });
        self.invoke(IFACE_POOL, "remove_member_v2", &params).await
    }

    async fn get_lb_method(&self, names: &[String]) -> RemoteResult<Vec<LbMethod>> {
        self.call(IFACE_POOL, "get_lb_method", &json!({ "pool_names": names }))
            .await
    }

    async fn set_lb_method(&self, names: &[String], methods: &[LbMethod]) -> RemoteResult<()> {
        let params = json!({ "pool_names": names, "lb_methods": methods });
        self.invoke(IFACE_POOL, "set_lb_method", &params).await
    }

    async fn get_monitor_association(
        &self,
        names: &[String],
    ) -> RemoteResult<Vec<MonitorAssociation>> {
        let params = json!({ "pool_names": names });
        self.call(IFACE_POOL, "get_monitor_association", &params).await
    }

    async fn set_monitor_association(&self, associations: &[MonitorAssociation]) -> RemoteResult<()> {
        let params = json!({ "monitor_associations": associations });
        self.invoke(IFACE_POOL, "set_monitor_association", &params)
            .await
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        self.call(IFACE_POOL, "get_description", &json!({ "pool_names": names }))
            .await
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        let params = json!({ "pool_names": names, "descriptions": descriptions });
        self.invoke(IFACE_POOL, "set_description", &params).await
    }
}

#[async_trait]
impl VirtualServerService for RpcClient {
    async fn create(
        &self,
        definitions: &[VirtualServerDefinition],
        wildmasks: &[String],
        resources: &[VirtualServerResource],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()> {
        let params = json!({
            "definitions": definitions,
            "wildmasks": wildmasks,
            "resources": resources,
            "profiles": profiles,
        });
        self.invoke(IFACE_VIRTUAL_SERVER, "create", &params).await
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names });
        self.invoke(IFACE_VIRTUAL_SERVER, "delete_virtual_server", &params)
            .await
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        self.call(IFACE_VIRTUAL_SERVER, "get_list", &json!({})).await
    }

    async fn get_destination(&self, names: &[String]) -> RemoteResult<Vec<IpPort>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_destination_v2", &params)
            .await
    }

    async fn set_destination(&self, names: &[String], destinations: &[IpPort]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "destinations": destinations });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_destination_v2", &params)
            .await
    }

    async fn get_wildmask(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_wildmask", &params).await
    }

    async fn set_wildmask(&self, names: &[String], wildmasks: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "wildmasks": wildmasks });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_wildmask", &params)
            .await
    }

    async fn get_type(&self, names: &[String]) -> RemoteResult<Vec<ResourceType>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_type", &params).await
    }

    async fn get_protocol(&self, names: &[String]) -> RemoteResult<Vec<Protocol>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_protocol", &params).await
    }

    async fn get_default_pool(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_default_pool_name", &params)
            .await
    }

    async fn set_default_pool(&self, names: &[String], pools: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "default_pools": pools });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_default_pool_name", &params)
            .await
    }

    async fn get_object_status(&self, names: &[String]) -> RemoteResult<Vec<ObjectStatus>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_object_status", &params)
            .await
    }

    async fn set_enabled_state(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "states": states });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_enabled_state", &params)
            .await
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_description", &params)
            .await
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "descriptions": descriptions });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_description", &params)
            .await
    }

    async fn get_source_address(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_source_address", &params)
            .await
    }

    async fn set_source_address(&self, names: &[String], addresses: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "addresses": addresses });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_source_address", &params)
            .await
    }

    async fn get_translate_address(&self, names: &[String]) -> RemoteResult<Vec<EnabledState>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_translate_address_state", &params)
            .await
    }

    async fn set_translate_address(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "states": states });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_translate_address_state", &params)
            .await
    }

    async fn get_translate_port(&self, names: &[String]) -> RemoteResult<Vec<EnabledState>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_translate_port_state", &params)
            .await
    }

    async fn set_translate_port(
        &self,
        names: &[String],
        states: &[EnabledState],
    ) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "states": states });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_translate_port_state", &params)
            .await
    }

    async fn get_profile(&self, names: &[String]) -> RemoteResult<Vec<Vec<ProfileAttribute>>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_profile", &params).await
    }

    async fn add_profile(
        &self,
        names: &[String],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "profiles": profiles });
        self.invoke(IFACE_VIRTUAL_SERVER, "add_profile", &params)
            .await
    }

    async fn remove_profile(
        &self,
        names: &[String],
        profiles: &[Vec<ProfileAttribute>],
    ) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "profiles": profiles });
        self.invoke(IFACE_VIRTUAL_SERVER, "remove_profile", &params)
            .await
    }

    async fn get_vlan(&self, names: &[String]) -> RemoteResult<Vec<VlanFilter>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_vlan", &params).await
    }

    async fn set_vlan(&self, names: &[String], vlans: &[VlanFilter]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "vlans": vlans });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_vlan", &params).await
    }

    async fn get_snat_type(&self, names: &[String]) -> RemoteResult<Vec<SnatType>> {
        let params = json!({ "virtual_servers": names });
        self.call(
            IFACE_VIRTUAL_SERVER,
            "get_source_address_translation_type",
            &params,
        )
        .await
    }

    async fn get_snat_pool(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "virtual_servers": names });
        self.call(
            IFACE_VIRTUAL_SERVER,
            "get_source_address_translation_snat_pool",
            &params,
        )
        .await
    }

    async fn set_snat_none(&self, names: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_snat_none", &params)
            .await
    }

    async fn set_snat_automap(&self, names: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_snat_automap", &params)
            .await
    }

    async fn set_snat_pool(&self, names: &[String], pools: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "snatpools": pools });
        self.invoke(IFACE_VIRTUAL_SERVER, "set_snat_pool", &params)
            .await
    }

    async fn get_persistence_profile(
        &self,
        names: &[String],
    ) -> RemoteResult<Vec<Vec<PersistenceProfile>>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_persistence_profile", &params)
            .await
    }

    async fn add_persistence_profile(
        &self,
        names: &[String],
        profiles: &[Vec<PersistenceProfile>],
    ) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "profiles": profiles });
        self.invoke(IFACE_VIRTUAL_SERVER, "add_persistence_profile", &params)
            .await
    }

    async fn remove_all_persistence_profiles(&self, names: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names });
        self.invoke(
            IFACE_VIRTUAL_SERVER,
            "remove_all_persistence_profiles",
            &params,
        )
        .await
    }

    async fn get_fallback_persistence_profile(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "virtual_servers": names });
        self.call(
            IFACE_VIRTUAL_SERVER,
            "get_fallback_persistence_profile",
            &params,
        )
        .await
    }

    async fn set_fallback_persistence_profile(
        &self,
        names: &[String],
        profiles: &[String],
    ) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "profile_names": profiles });
        self.invoke(
            IFACE_VIRTUAL_SERVER,
            "set_fallback_persistence_profile",
            &params,
        )
        .await
    }

    async fn get_rules(&self, names: &[String]) -> RemoteResult<Vec<Vec<RuleAssignment>>> {
        let params = json!({ "virtual_servers": names });
        self.call(IFACE_VIRTUAL_SERVER, "get_rule", &params).await
    }

    async fn add_rules(&self, names: &[String], rules: &[Vec<RuleAssignment>]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names, "rules": rules });
        self.invoke(IFACE_VIRTUAL_SERVER, "add_rule", &params).await
    }

    async fn remove_all_rules(&self, names: &[String]) -> RemoteResult<()> {
        let params = json!({ "virtual_servers": names });
        self.invoke(IFACE_VIRTUAL_SERVER, "remove_all_rules", &params)
            .await
    }
}

#[async_trait]
impl MonitorService for RpcClient {
    async fn create_template(
        &self,
        templates: &[MonitorTemplate],
        attributes: &[CommonAttributes],
    ) -> RemoteResult<()> {
        let params = json!({ "templates": templates, "template_attributes": attributes });
        self.invoke(IFACE_MONITOR, "create_template", &params).await
    }

    async fn delete_template(&self, names: &[String]) -> RemoteResult<()> {
        let params = json!({ "template_names": names });
        self.invoke(IFACE_MONITOR, "delete_template", &params).await
    }

    async fn get_template_list(&self) -> RemoteResult<Vec<MonitorTemplate>> {
        self.call(IFACE_MONITOR, "get_template_list", &json!({}))
            .await
    }

    async fn is_template_root(&self, names: &[String]) -> RemoteResult<Vec<bool>> {
        let params = json!({ "template_names": names });
        self.call(IFACE_MONITOR, "is_template_root", &params).await
    }

    async fn get_parent_template(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "template_names": names });
        self.call(IFACE_MONITOR, "get_parent_template", &params).await
    }

    async fn get_template_destination(&self, names: &[String]) -> RemoteResult<Vec<MonitorIpPort>> {
        let params = json!({ "template_names": names });
        self.call(IFACE_MONITOR, "get_template_destination", &params)
            .await
    }

    async fn set_template_destination(
        &self,
        names: &[String],
        destinations: &[MonitorIpPort],
    ) -> RemoteResult<()> {
        let params = json!({ "template_names": names, "destinations": destinations });
        self.invoke(IFACE_MONITOR, "set_template_destination", &params)
            .await
    }

    async fn get_integer_property(
        &self,
        names: &[String],
        property_types: &[IntegerPropertyType],
    ) -> RemoteResult<Vec<IntegerProperty>> {
        let params = json!({ "template_names": names, "property_types": property_types });
        self.call(IFACE_MONITOR, "get_template_integer_property", &params)
            .await
    }

    async fn set_integer_property(
        &self,
        names: &[String],
        values: &[IntegerProperty],
    ) -> RemoteResult<()> {
        let params = json!({ "template_names": names, "values": values });
        self.invoke(IFACE_MONITOR, "set_template_integer_property", &params)
            .await
    }

    async fn get_string_property(
        &self,
        names: &[String],
        property_types: &[StringPropertyType],
    ) -> RemoteResult<Vec<StringProperty>> {
        let params = json!({ "template_names": names, "property_types": property_types });
        self.call(IFACE_MONITOR, "get_template_string_property", &params)
            .await
    }

    async fn set_string_property(&self, names: &[String], values: &[StringProperty]) -> RemoteResult<()> {
        let params = json!({ "template_names": names, "values": values });
        self.invoke(IFACE_MONITOR, "set_template_string_property", &params)
            .await
    }

    async fn get_description(&self, names: &[String]) -> RemoteResult<Vec<String>> {
        let params = json!({ "template_names": names });
        self.call(IFACE_MONITOR, "get_description", &params).await
    }

    async fn set_description(&self, names: &[String], descriptions: &[String]) -> RemoteResult<()> {
        let params = json!({ "template_names": names, "descriptions": descriptions });
        self.invoke(IFACE_MONITOR, "set_description", &params).await
    }
}

#[async_trait]
impl ClassService for RpcClient {
    async fn get_address_class(&self, names: &[String]) -> RemoteResult<Vec<AddressClass>> {
        self.call(IFACE_CLASS, "get_address_class", &json!({ "class_names": names }))
            .await
    }

    async fn create_address_class(&self, classes: &[AddressClass]) -> RemoteResult<()> {
        self.invoke(IFACE_CLASS, "create_address_class", &json!({ "classes": classes }))
            .await
    }

    async fn modify_address_class(&self, classes: &[AddressClass]) -> RemoteResult<()> {
        self.invoke(IFACE_CLASS, "modify_address_class", &json!({ "classes": classes }))
            .await
    }

    async fn get_address_class_member_data_value(
        &self,
        classes: &[AddressClass],
    ) -> RemoteResult<Vec<Vec<String>>> {
        let params = json!({ "class_members": classes });
        self.call(IFACE_CLASS, "get_address_class_member_data_value", &params)
            .await
    }

    async fn set_address_class_member_data_value(
        &self,
        classes: &[AddressClass],
        values: &[Vec<String>],
    ) -> RemoteResult<()> {
        let params = json!({ "class_members": classes, "values": values });
        self.invoke(IFACE_CLASS, "set_address_class_member_data_value", &params)
            .await
    }

    async fn get_string_class(&self, names: &[String]) -> RemoteResult<Vec<StringClass>> {
        self.call(IFACE_CLASS, "get_string_class", &json!({ "class_names": names }))
            .await
    }

    async fn create_string_class(&self, classes: &[StringClass]) -> RemoteResult<()> {
        self.invoke(IFACE_CLASS, "create_string_class", &json!({ "classes": classes }))
            .await
    }

    async fn modify_string_class(&self, classes: &[StringClass]) -> RemoteResult<()> {
        self.invoke(IFACE_CLASS, "modify_string_class", &json!({ "classes": classes }))
            .await
    }

    async fn get_string_class_member_data_value(
        &self,
        classes: &[StringClass],
    ) -> RemoteResult<Vec<Vec<String>>> {
        let params = json!({ "class_members": classes });
        self.call(IFACE_CLASS, "get_string_class_member_data_value", &params)
            .await
    }

    async fn set_string_class_member_data_value(
        &self,
        classes: &[StringClass],
        values: &[Vec<String>],
    ) -> RemoteResult<()> {
        let params = json!({ "class_members": classes, "values": values });
        self.invoke(IFACE_CLASS, "set_string_class_member_data_value", &params)
            .await
    }

    async fn delete_class(&self, names: &[String]) -> RemoteResult<()> {
        self.invoke(IFACE_CLASS, "delete_class", &json!({ "classes": names }))
            .await
    }
}

#[async_trait]
impl RuleService for RpcClient {
    async fn create(&self, rules: &[RuleDefinition]) -> RemoteResult<()> {
        self.invoke(IFACE_RULE, "create", &json!({ "rules": rules }))
            .await
    }

    async fn modify(&self, rules: &[RuleDefinition]) -> RemoteResult<()> {
        self.invoke(IFACE_RULE, "modify_rule", &json!({ "rules": rules }))
            .await
    }

    async fn delete(&self, names: &[String]) -> RemoteResult<()> {
        self.invoke(IFACE_RULE, "delete_rule", &json!({ "rule_names": names }))
            .await
    }

    async fn list(&self) -> RemoteResult<Vec<String>> {
        self.call(IFACE_RULE, "get_list", &json!({})).await
    }

    async fn query(&self, names: &[String]) -> RemoteResult<Vec<RuleDefinition>> {
        self.call(IFACE_RULE, "query_rule", &json!({ "rule_names": names }))
            .await
    }
}

#[async_trait]
impl KeyCertificateService for RpcClient {
    async fn get_certificate_list(&self, mode: ManagementMode) -> RemoteResult<Vec<String>> {
        self.call(IFACE_KEY_CERTIFICATE, "get_certificate_list", &json!({ "mode": mode }))
            .await
    }

    async fn get_key_list(&self, mode: ManagementMode) -> RemoteResult<Vec<String>> {
        self.call(IFACE_KEY_CERTIFICATE, "get_key_list", &json!({ "mode": mode }))
            .await
    }

    async fn certificate_import_from_pem(
        &self,
        mode: ManagementMode,
        ids: &[String],
        pems: &[String],
        overwrite: bool,
    ) -> RemoteResult<()> {
        let params = json!({
            "mode": mode,
            "cert_ids": ids,
            "pem_data": pems,
            "overwrite": overwrite,
        });
        self.invoke(IFACE_KEY_CERTIFICATE, "certificate_import_from_pem", &params)
            .await
    }

    async fn key_import_from_pem(
        &self,
        mode: ManagementMode,
        ids: &[String],
        pems: &[String],
        overwrite: bool,
    ) -> RemoteResult<()> {
        let params = json!({
            "mode": mode,
            "key_ids": ids,
            "pem_data": pems,
            "overwrite": overwrite,
        });
        self.invoke(IFACE_KEY_CERTIFICATE, "key_import_from_pem", &params)
            .await
    }

    async fn certificate_delete(&self, mode: ManagementMode, ids: &[String]) -> RemoteResult<()> {
        let params = json!({ "mode": mode, "cert_ids": ids });
        self.invoke(IFACE_KEY_CERTIFICATE, "certificate_delete", &params)
            .await
    }

    async fn key_delete(&self, mode: ManagementMode, ids: &[String]) -> RemoteResult<()> {
        let params = json!({ "mode": mode, "key_ids": ids });
        self.invoke(IFACE_KEY_CERTIFICATE, "key_delete", &params)
            .await
    }
}

#[async_trait]
impl ConfigSyncService for RpcClient {
    async fn synchronize_to_group(&self, group: &str, device: &str, force: bool) -> RemoteResult<()> {
        let params = json!({ "group": group, "device": device, "force": force });
        self.invoke(IFACE_CONFIG_SYNC, "synchronize_to_group_v2", &params)
            .await
    }
}

#[async_trait]
impl SessionService for RpcClient {
    async fn get_active_folder(&self) -> RemoteResult<String> {
        self.call(IFACE_SESSION, "get_active_folder", &json!({}))
            .await
    }

    async fn set_active_folder(&self, folder: &str) -> RemoteResult<()> {
        self.invoke(IFACE_SESSION, "set_active_folder", &json!({ "folder": folder }))
            .await
    }

    async fn get_partition_list(&self) -> RemoteResult<Vec<String>> {
        let entries: Vec<PartitionEntry> = self
            .call(IFACE_PARTITION, "get_partition_list", &json!({}))
            .await?;
        Ok(entries.into_iter().map(|entry| entry.partition_name).collect())
    }
}

#[async_trait]
impl FailoverService for RpcClient {
    async fn get_failover_state(&self) -> RemoteResult<FailoverState> {
        self.call(IFACE_FAILOVER, "get_failover_state", &json!({}))
            .await
    }
}

#[async_trait]
impl DeviceGroupService for RpcClient {
    async fn get_list(&self) -> RemoteResult<Vec<String>> {
        self.call(IFACE_DEVICE_GROUP, "get_list", &json!({})).await
    }
}

#[async_trait]
impl InetService for RpcClient {
    async fn get_hostname(&self) -> RemoteResult<String> {
        self.call(IFACE_INET, "get_hostname", &json!({})).await
    }
}
