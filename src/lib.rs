// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # ltmsync - declarative LTM convergence
//!
//! ltmsync converges Local Traffic Manager objects on a load-balancer appliance
//! to a declared desired state through the appliance's RPC-style management API.
//!
//! ## Overview
//!
//! For every declared resource the library fetches the current remote state,
//! plans the smallest set of remote mutations that converge it to the desired
//! state, and applies them in a dependency-respecting order:
//!
//! - Nodes, pools and pool members
//! - Health monitor templates
//! - Virtual servers (profiles, iRules, persistence, SNAT, VLANs)
//! - Address and string data classes
//! - iRules
//! - SSL certificate/key pairs
//! - Config-sync to high-availability peers
//!
//! ## Modules
//!
//! - [`icontrol`] - Typed remote facade, one service trait per object family
//! - [`collections`] - Bulk loaders that build current-state snapshots
//! - [`partition`] - Active folder tracking and the collection cache
//! - [`device`] - Per-appliance handle combining the facade, folder and cache
//! - [`resources`] - Desired-state declarations for every resource kind
//! - [`reconcilers`] - Plan/apply reconciliation for each resource kind
//! - [`provisioner`] - Batch orchestration across devices
//! - [`config`] - Connection configuration and declaration loading
//! - [`report`] - JSON run report
//!
//! ## Example
//!
//! ```rust,no_run
//! use ltmsync::device::LoadBalancer;
//! use ltmsync::icontrol::{ConnectionSettings, Remote, RpcClient};
//! use ltmsync::reconcilers::reconcile_pool;
//! use ltmsync::resources::PoolSpec;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = RpcClient::new(&ConnectionSettings::new("lb1.example.com", "admin", "secret"))?;
//! let mut device = LoadBalancer::connect("lb1.example.com", Remote::from_client(Arc::new(client))).await?;
//!
//! let pool: PoolSpec = serde_yaml::from_str(
//!     "name: web\nmembers:\n  - { address: 10.0.0.1, port: 80 }\n",
//! )?;
//! let outcome = reconcile_pool(&mut device, &pool).await?;
//! println!("{} mutations", outcome.mutations.len());
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod wire_enum;

pub mod collections;
pub mod config;
pub mod constants;
pub mod device;
pub mod errors;
pub mod icontrol;
pub mod metrics;
pub mod names;
pub mod partition;
pub mod provisioner;
pub mod reconcilers;
pub mod report;
pub mod resources;

#[cfg(test)]
pub(crate) mod testing;
