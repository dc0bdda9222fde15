// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Node address snapshot.

use tracing::debug;

use super::zip_into;
use crate::constants::{DEFAULT_FOLDER, IFACE_NODE};
use crate::errors::RemoteError;
use crate::icontrol::Remote;
use crate::names::{folder_of, matches_name, strip_folder};

/// A node as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Qualified node name, e.g. `/Common/web01`
    pub name: String,
    pub address: String,
    pub enabled: bool,
    pub description: String,
    /// Folder the node lives in, derived from its name
    pub partition: String,
}

impl Node {
    fn named(name: String) -> Self {
        let partition = folder_of(&name).unwrap_or(DEFAULT_FOLDER).to_string();
        Self {
            name,
            address: String::new(),
            enabled: true,
            description: String::new(),
            partition,
        }
    }
}

/// Every node visible from the active folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCollection {
    nodes: Vec<Node>,
}

impl NodeCollection {
    /// Load every node with its address, status and description.
    ///
    /// # Errors
    ///
    /// Returns an error if any bulk call fails or returns a misaligned result.
    pub async fn load(remote: &Remote) -> Result<Self, RemoteError> {
        let names = remote.nodes.list().await?;
        let mut nodes: Vec<Node> = names.iter().cloned().map(Node::named).collect();

        if !nodes.is_empty() {
            let addresses = remote.nodes.get_address(&names).await?;
            zip_into(&mut nodes, addresses, IFACE_NODE, "get_address", |node, address| {
                node.address = address;
            })?;

            let statuses = remote.nodes.get_object_status(&names).await?;
            zip_into(&mut nodes, statuses, IFACE_NODE, "get_object_status", |node, status| {
                node.enabled = status.is_enabled();
            })?;

            let descriptions = remote.nodes.get_description(&names).await?;
            zip_into(&mut nodes, descriptions, IFACE_NODE, "get_description", |node, text| {
                node.description = text;
            })?;
        }

        debug!(count = nodes.len(), "Loaded nodes");
        Ok(Self { nodes })
    }

    /// Node whose name matches `name`, exactly or as a folder-qualified suffix.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| matches_name(&node.name, name))
    }

    /// Node whose address matches `address`, ignoring folder decoration.
    #[must_use]
    pub fn find_by_address(&self, address: &str) -> Option<&Node> {
        let wanted = strip_folder(address);
        self.nodes
            .iter()
            .find(|node| strip_folder(&node.address) == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
