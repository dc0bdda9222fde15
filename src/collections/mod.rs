// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Current-state snapshots of the LTM object families.
//!
//! Each collection is loaded in bulk: one `list` call, then one bulk getter per
//! attribute, with results zipped back onto the listed names by position. The
//! collections are read caches; they are rebuilt rather than patched whenever
//! a reconciler changes the family they cover.
//!
//! - [`NodeCollection`] - Node addresses
//! - [`PoolCollection`] - Pools with members and monitors
//! - [`VirtualServerCollection`] - Virtual servers with every managed attribute
//! - [`MonitorCollection`] - Non-root monitor templates

pub mod monitors;
pub mod nodes;
pub mod pools;
pub mod virtual_servers;

pub use monitors::{Monitor, MonitorCollection};
pub use nodes::{Node, NodeCollection};
pub use pools::{member_key, Pool, PoolCollection};
pub use virtual_servers::{VirtualServer, VirtualServerCollection};

use crate::errors::RemoteError;

/// Assigns one bulk getter's results onto the records they were fetched for.
///
/// # Errors
///
/// Returns [`RemoteError::LengthMismatch`] if the getter did not return exactly
/// one value per record.
pub(crate) fn zip_into<R, T>(
    records: &mut [R],
    values: Vec<T>,
    interface: &'static str,
    method: &'static str,
    mut assign: impl FnMut(&mut R, T),
) -> Result<(), RemoteError> {
    if values.len() != records.len() {
        return Err(RemoteError::LengthMismatch {
            interface,
            method,
            expected: records.len(),
            actual: values.len(),
        });
    }
    for (record, value) in records.iter_mut().zip(values) {
        assign(record, value);
    }
    Ok(())
}
