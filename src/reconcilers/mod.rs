// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for every LTM resource kind.
//!
//! Each reconciler converges one declared resource on one device.
//!
//! # Reconciliation Architecture
//!
//! Every reconciler follows the same plan/apply pattern:
//!
//! 1. **Load** - Fetch a current-state snapshot through the device's collection cache
//! 2. **Plan** - Compare snapshot and declaration in a pure function returning typed actions
//! 3. **Apply** - Execute the actions one after another through the remote facade
//! 4. **Report** - Return a [`ReconcileOutcome`] naming every operation applied
//!
//! Objects that do not exist yet are created first; the cache entry for the
//! family is then invalidated, the snapshot reloaded, and the attribute plan
//! runs against what the device actually created.
//!
//! # Available Reconcilers
//!
//! - [`reconcile_node`] / [`delete_node`] - Node addresses
//! - [`reconcile_pool`] / [`delete_pool`] - Pools, members and monitor association
//! - [`reconcile_virtual_server`] / [`delete_virtual_server`] - Virtual servers
//! - [`reconcile_monitor`] / [`delete_monitor`] - Health monitor templates
//! - [`reconcile_address_class`] / [`delete_address_class`] - Address data classes
//! - [`reconcile_string_class`] / [`delete_string_class`] - String data classes
//! - [`reconcile_irule`] / [`delete_irule`] - iRules
//! - [`reconcile_ssl_cert`] / [`delete_ssl_cert`] - SSL certificate/key pairs
//! - [`sync_config`] - Config-sync to high-availability peers

pub mod config_sync;
pub mod data_class;
pub mod irule;
pub mod monitor;
pub mod node;
pub mod pool;
pub mod ssl_cert;
pub mod virtual_server;

pub use config_sync::{sync_config, ConfigSyncOutcome};
pub use data_class::{
    delete_address_class, delete_string_class, reconcile_address_class, reconcile_string_class,
};
pub use irule::{delete_irule, reconcile_irule};
pub use monitor::{delete_monitor, reconcile_monitor};
pub use node::{delete_node, reconcile_node};
pub use pool::{delete_pool, reconcile_pool};
pub use ssl_cert::{delete_ssl_cert, reconcile_ssl_cert};
pub use virtual_server::{delete_virtual_server, reconcile_virtual_server};

use async_trait::async_trait;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, RemoteError, ResourceKind};
use crate::icontrol::{Remote, RemoteResult};
use crate::metrics::{
    record_reconciliation_error, record_reconciliation_success, record_remote_mutation,
};

/// Operations applied while converging one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub kind: ResourceKind,
    pub name: String,
    /// Mutating operations in the order they were applied
    pub mutations: Vec<&'static str>,
}

impl ReconcileOutcome {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            mutations: Vec::new(),
        }
    }

    /// Whether any mutation was applied.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.mutations.is_empty()
    }
}

/// A single planned remote mutation.
#[async_trait]
pub(crate) trait RemoteMutation: Send + Sync {
    /// Short operation label used in logs, errors and metrics.
    fn operation(&self) -> &'static str;

    async fn execute(&self, remote: &Remote) -> RemoteResult<()>;
}

/// Apply `actions` in order, stopping at the first failure.
///
/// Each applied action is logged, counted, and appended to `outcome`.
pub(crate) async fn apply_actions<A: RemoteMutation>(
    device: &LoadBalancer,
    actions: &[A],
    outcome: &mut ReconcileOutcome,
) -> Result<(), ReconcileError> {
    for action in actions {
        let operation = action.operation();
        info!(
            device = %device.hostname(),
            kind = %outcome.kind,
            name = %outcome.name,
            operation,
            "Applying change"
        );
        action
            .execute(device.remote())
            .await
            .map_err(|e| ReconcileError::remote(outcome.kind, outcome.name.as_str(), operation, e))?;
        record_remote_mutation(outcome.kind.as_str(), operation);
        outcome.mutations.push(operation);
    }
    Ok(())
}

/// Attach the resource and operation to a failed read.
pub(crate) trait RemoteResultExt<T> {
    fn during(
        self,
        kind: ResourceKind,
        name: &str,
        operation: &'static str,
    ) -> Result<T, ReconcileError>;
}

impl<T> RemoteResultExt<T> for Result<T, RemoteError> {
    fn during(
        self,
        kind: ResourceKind,
        name: &str,
        operation: &'static str,
    ) -> Result<T, ReconcileError> {
        self.map_err(|e| ReconcileError::remote(kind, name, operation, e))
    }
}

/// Record duration and status of one reconciliation, passing the result through.
pub(crate) fn finish(
    device: &LoadBalancer,
    started: Instant,
    result: Result<ReconcileOutcome, ReconcileError>,
) -> Result<ReconcileOutcome, ReconcileError> {
    let elapsed = started.elapsed();
    match &result {
        Ok(outcome) => {
            record_reconciliation_success(outcome.kind.as_str(), elapsed);
            if outcome.changed() {
                info!(
                    device = %device.hostname(),
                    kind = %outcome.kind,
                    name = %outcome.name,
                    mutations = outcome.mutations.len(),
                    "Resource converged"
                );
            } else {
                debug!(
                    device = %device.hostname(),
                    kind = %outcome.kind,
                    name = %outcome.name,
                    "Resource already in desired state"
                );
            }
        }
        Err(e) => record_reconciliation_error(e.kind().as_str(), elapsed),
    }
    result
}
