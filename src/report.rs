// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Run report.
//!
//! A [`RunReport`] records, per device, every resource the run touched, what
//! happened to it, and the outcome of the deferred config-sync. It is
//! serialised to JSON with `--report`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::{ReconcileError, ResourceKind};
use crate::reconcilers::{ConfigSyncOutcome, ReconcileOutcome};

/// What the run asked for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Delete,
}

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Already in the desired state
    Unchanged,
    /// At least one mutation was applied
    Changed,
    Failed,
}

/// Result of one resource reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub kind: ResourceKind,
    pub name: String,
    pub action: Action,
    pub status: ResourceStatus,
    pub mutations: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceReport {
    pub fn from_result(
        action: Action,
        kind: ResourceKind,
        name: &str,
        result: Result<ReconcileOutcome, ReconcileError>,
    ) -> Self {
        match result {
            Ok(outcome) => Self {
                kind,
                name: name.to_string(),
                action,
                status: if outcome.changed() {
                    ResourceStatus::Changed
                } else {
                    ResourceStatus::Unchanged
                },
                mutations: outcome.mutations,
                error: None,
            },
            Err(e) => Self {
                kind,
                name: name.to_string(),
                action,
                status: ResourceStatus::Failed,
                mutations: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// Result of the config-sync trigger for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncReport {
    Completed { outcome: ConfigSyncOutcome },
    Failed { error: String },
}

impl From<Result<ConfigSyncOutcome, ReconcileError>> for SyncReport {
    fn from(result: Result<ConfigSyncOutcome, ReconcileError>) -> Self {
        match result {
            Ok(outcome) => Self::Completed { outcome },
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Everything that happened on one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub hostname: String,
    /// Set when the device could not be reached at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub resources: Vec<ResourceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncReport>,
}

impl DeviceReport {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            error: None,
            resources: Vec::new(),
            sync: None,
        }
    }

    /// Whether any resource on this device was mutated.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.resources
            .iter()
            .any(|r| r.status == ResourceStatus::Changed)
    }

    /// Failed resources, plus one for an unreachable device and one for a failed sync.
    #[must_use]
    pub fn failures(&self) -> usize {
        let resources = self
            .resources
            .iter()
            .filter(|r| r.status == ResourceStatus::Failed)
            .count();
        let sync = usize::from(matches!(self.sync, Some(SyncReport::Failed { .. })));
        resources + sync + usize::from(self.error.is_some())
    }
}

/// Report of one provisioning or sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub devices: Vec<DeviceReport>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            devices: Vec::new(),
        }
    }

    /// Stamp the end of the run and log a summary.
    pub fn finish(&mut self) {
        let finished = Utc::now();
        self.finished_at = Some(finished);

        let elapsed = finished - self.started_at;
        let failures = self.failures();
        if failures == 0 {
            info!(
                devices = self.devices.len(),
                changed = self.changed_resources(),
                elapsed_ms = elapsed.num_milliseconds(),
                "Run completed"
            );
        } else {
            warn!(
                devices = self.devices.len(),
                changed = self.changed_resources(),
                failures,
                elapsed_ms = elapsed.num_milliseconds(),
                "Run completed with failures"
            );
        }
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.devices.iter().map(DeviceReport::failures).sum()
    }

    #[must_use]
    pub fn changed_resources(&self) -> usize {
        self.devices
            .iter()
            .flat_map(|d| &d.resources)
            .filter(|r| r.status == ResourceStatus::Changed)
            .count()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be serialised or written.
    pub async fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialise run report")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write run report {}", path.display()))
    }
}
