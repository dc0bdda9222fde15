// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Remote management API facade.
//!
//! The appliance exposes its configuration through an RPC-style API grouped by
//! object family. This module models each family as a typed service trait and
//! bundles them into [`Remote`], the handle every loader and reconciler uses:
//!
//! - [`services`] - One `async` trait per object family
//! - [`types`] - Wire enumerations and records
//! - [`transport`] - JSON-over-HTTP [`RpcClient`] implementing every family
//!
//! # Example
//!
//! ```rust,no_run
//! use ltmsync::icontrol::{ConnectionSettings, Remote, RpcClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = RpcClient::new(&ConnectionSettings::new("lb1.example.com", "admin", "secret"))?;
//! let remote = Remote::from_client(Arc::new(client));
//!
//! let pools = remote.pools.list().await?;
//! println!("{} pools in the active folder", pools.len());
//! # Ok(())
//! # }
//! ```

pub mod services;
pub mod transport;
pub mod types;

mod rpc;

pub use services::{
    ClassService, ConfigSyncService, DeviceGroupService, FailoverService, InetService,
    KeyCertificateService, MonitorService, NodeService, PoolService, RemoteResult, RuleService,
    SessionService, VirtualServerService,
};
pub use transport::{ConnectionSettings, RpcClient};

use std::fmt;
use std::sync::Arc;

/// Typed handle on every object family of one device.
///
/// Cloning is cheap; all clones share the same underlying client.
#[derive(Clone)]
pub struct Remote {
    pub nodes: Arc<dyn NodeService>,
    pub pools: Arc<dyn PoolService>,
    pub virtual_servers: Arc<dyn VirtualServerService>,
    pub monitors: Arc<dyn MonitorService>,
    pub classes: Arc<dyn ClassService>,
    pub rules: Arc<dyn RuleService>,
    pub certificates: Arc<dyn KeyCertificateService>,
    pub config_sync: Arc<dyn ConfigSyncService>,
    pub session: Arc<dyn SessionService>,
    pub failover: Arc<dyn FailoverService>,
    pub device_groups: Arc<dyn DeviceGroupService>,
    pub inet: Arc<dyn InetService>,
}

impl Remote {
    /// Build a facade from one client that implements every family.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: NodeService
            + PoolService
            + VirtualServerService
            + MonitorService
            + ClassService
            + RuleService
            + KeyCertificateService
            + ConfigSyncService
            + SessionService
            + FailoverService
            + DeviceGroupService
            + InetService
            + 'static,
    {
        Self {
            nodes: client.clone(),
            pools: client.clone(),
            virtual_servers: client.clone(),
            monitors: client.clone(),
            classes: client.clone(),
            rules: client.clone(),
            certificates: client.clone(),
            config_sync: client.clone(),
            session: client.clone(),
            failover: client.clone(),
            device_groups: client.clone(),
            inet: client,
        }
    }
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote").finish_non_exhaustive()
    }
}
