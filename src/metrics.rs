// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for ltmsync.
//!
//! All metrics carry the `ltmsync_` prefix and live in [`METRICS_REGISTRY`].
//! A provisioning run is a short-lived batch, so the registry is rendered once
//! at exit (see `--metrics-file`) rather than served.
//!
//! # Metrics
//!
//! - `ltmsync_reconciliations_total{resource_type,status}` - Reconciliation outcomes
//! - `ltmsync_reconciliation_duration_seconds{resource_type}` - Reconciliation latency
//! - `ltmsync_remote_mutations_total{resource_type,operation}` - Mutating remote calls issued
//! - `ltmsync_config_syncs_total{status}` - Config-sync attempts
//!
//! # Example
//!
//! ```rust,no_run
//! use ltmsync::metrics::{gather_metrics, record_reconciliation_success};
//!
//! record_reconciliation_success("pool", std::time::Duration::from_millis(120));
//! println!("{}", gather_metrics().unwrap_or_default());
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::warn;

use crate::constants::METRICS_NAMESPACE;

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Registered metric families; `None` if registration failed.
static METRICS: LazyLock<Option<LtmMetrics>> =
    LazyLock::new(|| match LtmMetrics::register(&METRICS_REGISTRY) {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!(error = %e, "Failed to register metrics, metrics are disabled");
            None
        }
    });

pub(crate) struct LtmMetrics {
    /// Total number of reconciliations by resource type and status
    ///
    /// Labels:
    /// - `resource_type`: Kind of resource (e.g., `pool`, `virtual server`)
    /// - `status`: Outcome (`success`, `error`)
    pub(crate) reconciliations_total: CounterVec,

    /// Duration of reconciliations in seconds
    ///
    /// Labels:
    /// - `resource_type`: Kind of resource
    pub(crate) reconciliation_duration_seconds: HistogramVec,

    /// Total number of mutating remote calls
    ///
    /// Labels:
    /// - `resource_type`: Kind of resource being converged
    /// - `operation`: Mutation applied (e.g., `add members`, `set destination`)
    pub(crate) remote_mutations_total: CounterVec,

    /// Total number of config-sync attempts
    ///
    /// Labels:
    /// - `status`: Outcome (`success`, `error`, `skipped`)
    pub(crate) config_syncs_total: CounterVec,
}

impl LtmMetrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let reconciliations_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_reconciliations_total"),
                "Total number of reconciliations by resource type and status",
            ),
            &["resource_type", "status"],
        )?;
        registry.register(Box::new(reconciliations_total.clone()))?;

        let reconciliation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
                "Duration of reconciliations in seconds by resource type",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["resource_type"],
        )?;
        registry.register(Box::new(reconciliation_duration_seconds.clone()))?;

        let remote_mutations_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_remote_mutations_total"),
                "Total number of mutating remote calls by resource type and operation",
            ),
            &["resource_type", "operation"],
        )?;
        registry.register(Box::new(remote_mutations_total.clone()))?;

        let config_syncs_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_config_syncs_total"),
                "Total number of config-sync attempts by status",
            ),
            &["status"],
        )?;
        registry.register(Box::new(config_syncs_total.clone()))?;

        Ok(Self {
            reconciliations_total,
            reconciliation_duration_seconds,
            remote_mutations_total,
            config_syncs_total,
        })
    }
}

pub(crate) fn metrics() -> Option<&'static LtmMetrics> {
    METRICS.as_ref()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled (e.g., `pool`)
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    record_reconciliation(resource_type, "success", duration);
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `duration` - Duration of the reconciliation before failure
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    record_reconciliation(resource_type, "error", duration);
}

fn record_reconciliation(resource_type: &str, status: &str, duration: Duration) {
    if let Some(m) = metrics() {
        m.reconciliations_total
            .with_label_values(&[resource_type, status])
            .inc();
        m.reconciliation_duration_seconds
            .with_label_values(&[resource_type])
            .observe(duration.as_secs_f64());
    }
}

/// Record one mutating remote call
///
/// # Arguments
/// * `resource_type` - The kind of resource being converged
/// * `operation` - The mutation applied
pub fn record_remote_mutation(resource_type: &str, operation: &str) {
    if let Some(m) = metrics() {
        m.remote_mutations_total
            .with_label_values(&[resource_type, operation])
            .inc();
    }
}

/// Record a config-sync attempt
///
/// # Arguments
/// * `status` - Outcome (`success`, `error`, `skipped`)
pub fn record_config_sync(status: &str) {
    if let Some(m) = metrics() {
        m.config_syncs_total.with_label_values(&[status]).inc();
    }
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    LazyLock::force(&METRICS);
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
