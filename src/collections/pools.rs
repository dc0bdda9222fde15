// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pool snapshot.

use tracing::debug;

use super::zip_into;
use crate::constants::IFACE_POOL;
use crate::errors::RemoteError;
use crate::icontrol::types::{LbMethod, MemberAddress};
use crate::icontrol::Remote;
use crate::names::{matches_name, strip_folder};

/// Comparison key of a pool member: folder-stripped address and port as text.
///
/// ```
/// use ltmsync::collections::member_key;
/// use ltmsync::icontrol::types::MemberAddress;
///
/// let member = MemberAddress { address: "/Common/10.0.0.1".into(), port: 80 };
/// assert_eq!(member_key(&member), ("10.0.0.1".to_string(), "80".to_string()));
/// ```
#[must_use]
pub fn member_key(member: &MemberAddress) -> (String, String) {
    (
        strip_folder(&member.address).to_string(),
        member.port.to_string(),
    )
}

/// A pool as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub name: String,
    pub lb_method: LbMethod,
    pub members: Vec<MemberAddress>,
    /// Monitor templates associated with the pool
    pub monitors: Vec<String>,
    pub description: String,
}

impl Pool {
    fn named(name: String) -> Self {
        Self {
            name,
            lb_method: LbMethod::default(),
            members: Vec::new(),
            monitors: Vec::new(),
            description: String::new(),
        }
    }

    /// Whether any member points at `address`, ignoring folder decoration.
    #[must_use]
    pub fn has_member_address(&self, address: &str) -> bool {
        let wanted = strip_folder(address);
        self.members
            .iter()
            .any(|member| strip_folder(&member.address) == wanted)
    }
}

/// Every pool visible from the active folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolCollection {
    pools: Vec<Pool>,
}

impl PoolCollection {
    /// Load every pool with its method, members, monitors and description.
    ///
    /// # Errors
    ///
    /// Returns an error if any bulk call fails or returns a misaligned result.
    pub async fn load(remote: &Remote) -> Result<Self, RemoteError> {
        let names = remote.pools.list().await?;
        let mut pools: Vec<Pool> = names.iter().cloned().map(Pool::named).collect();

        if !pools.is_empty() {
            let methods = remote.pools.get_lb_method(&names).await?;
            zip_into(&mut pools, methods, IFACE_POOL, "get_lb_method", |pool, method| {
                pool.lb_method = method;
            })?;

            let members = remote.pools.get_members(&names).await?;
            zip_into(&mut pools, members, IFACE_POOL, "get_member_v2", |pool, members| {
                pool.members = members;
            })?;

            let associations = remote.pools.get_monitor_association(&names).await?;
            zip_into(
                &mut pools,
                associations,
                IFACE_POOL,
                "get_monitor_association",
                |pool, association| {
                    pool.monitors = association.monitor_rule.monitor_templates;
                },
            )?;

            let descriptions = remote.pools.get_description(&names).await?;
            zip_into(&mut pools, descriptions, IFACE_POOL, "get_description", |pool, text| {
                pool.description = text;
            })?;
        }

        debug!(count = pools.len(), "Loaded pools");
        Ok(Self { pools })
    }

    /// Pool whose name matches `name`, exactly or as a folder-qualified suffix.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Pool> {
        self.pools.iter().find(|pool| matches_name(&pool.name, name))
    }

    /// Pools that hold at least one member at `address`.
    pub fn referencing_address<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a Pool> {
        self.pools
            .iter()
            .filter(move |pool| pool.has_member_address(address))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pool> {
        self.pools.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
