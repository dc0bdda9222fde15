// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Active folder tracking and the LTM collection cache.
//!
//! Every remote call resolves bare object names against the device session's
//! active folder. [`FolderContext`] remembers that folder so that switching is
//! only issued when the target differs, and every switch clears the
//! [`LtmCache`] since the loaded collections describe the previous folder.

use std::collections::HashMap;
use tracing::info;

use crate::collections::{
    MonitorCollection, NodeCollection, PoolCollection, VirtualServerCollection,
};
use crate::errors::RemoteError;
use crate::icontrol::SessionService;
use crate::names::folder_of;

/// Object families held in the [`LtmCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Nodes,
    Pools,
    VirtualServers,
    Monitors,
}

/// Loaded collections keyed by (folder, kind).
///
/// Entries are filled lazily by the device handle and dropped either
/// explicitly, when a reconciler mutates a family, or wholesale on a folder
/// switch.
#[derive(Debug, Default)]
pub struct LtmCache {
    pub(crate) nodes: HashMap<String, NodeCollection>,
    pub(crate) pools: HashMap<String, PoolCollection>,
    pub(crate) virtual_servers: HashMap<String, VirtualServerCollection>,
    pub(crate) monitors: HashMap<String, MonitorCollection>,
}

impl LtmCache {
    /// Whether `kind` is cached for `folder`.
    #[must_use]
    pub fn contains(&self, folder: &str, kind: CollectionKind) -> bool {
        match kind {
            CollectionKind::Nodes => self.nodes.contains_key(folder),
            CollectionKind::Pools => self.pools.contains_key(folder),
            CollectionKind::VirtualServers => self.virtual_servers.contains_key(folder),
            CollectionKind::Monitors => self.monitors.contains_key(folder),
        }
    }

    /// Drop every cached entry of `kind`.
    pub fn invalidate(&mut self, kind: CollectionKind) {
        match kind {
            CollectionKind::Nodes => self.nodes.clear(),
            CollectionKind::Pools => self.pools.clear(),
            CollectionKind::VirtualServers => self.virtual_servers.clear(),
            CollectionKind::Monitors => self.monitors.clear(),
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.pools.clear();
        self.virtual_servers.clear();
        self.monitors.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.pools.is_empty()
            && self.virtual_servers.is_empty()
            && self.monitors.is_empty()
    }
}

/// The device session's active folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderContext {
    active: String,
}

impl FolderContext {
    /// Start from the folder reported by the device (`/Common` or `Common`).
    pub fn new(active: &str) -> Self {
        Self {
            active: active.trim_matches('/').to_string(),
        }
    }

    /// Active folder without slashes, e.g. `Common`.
    #[must_use]
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Folder an object name lives in: its own for qualified names, else the active one.
    #[must_use]
    pub fn folder_for<'a>(&'a self, name: &'a str) -> &'a str {
        folder_of(name).unwrap_or(&self.active)
    }

    /// Make `folder` active, clearing `cache` when a switch happens.
    ///
    /// Returns `true` if a remote call was issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the folder change; the
    /// remembered folder and the cache are left untouched.
    pub async fn switch_to(
        &mut self,
        folder: &str,
        session: &dyn SessionService,
        cache: &mut LtmCache,
    ) -> Result<bool, RemoteError> {
        let folder = folder.trim_matches('/');
        if folder.is_empty() || folder == self.active {
            return Ok(false);
        }

        session.set_active_folder(&format!("/{folder}")).await?;
        info!(from = %self.active, to = %folder, "Switched active folder");
        self.active = folder.to_string();
        cache.clear();
        Ok(true)
    }
}
