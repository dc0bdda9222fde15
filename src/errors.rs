// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for ltmsync.
//!
//! This module provides specialized error types for:
//! - Remote management API calls (transport, HTTP status, payload decoding)
//! - Contract violations detected before any remote call is attempted
//! - Reconciliation failures that identify the resource and the operation
//!
//! Remote errors are always fatal to the resource being converged and are
//! never retried. Contract errors distinguish invalid input from remote state.

use std::fmt;
use thiserror::Error;

/// Kinds of resources that ltmsync converges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Node,
    Pool,
    VirtualServer,
    Monitor,
    AddressClass,
    StringClass,
    #[serde(rename = "irule")]
    IRule,
    SslCert,
    ConfigSync,
}

impl ResourceKind {
    /// Human-readable name used in logs, errors and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Pool => "pool",
            Self::VirtualServer => "virtual server",
            Self::Monitor => "monitor",
            Self::AddressClass => "address class",
            Self::StringClass => "string class",
            Self::IRule => "iRule",
            Self::SslCert => "ssl certificate",
            Self::ConfigSync => "config sync",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prefixed device constant that does not map to a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised {kind} value '{value}'")]
pub struct UnknownVariant {
    /// The enum being parsed
    pub kind: &'static str,
    /// The offending value
    pub value: String,
}

/// Errors returned by the remote management API.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The device answered with a non-success HTTP status
    #[error("{interface}.{method} failed on {host} (HTTP {status}): {message}")]
    CallFailed {
        /// Management interface, e.g. `LocalLB.Pool`
        interface: &'static str,
        /// Method name, e.g. `create_v2`
        method: &'static str,
        /// Device hostname
        host: String,
        /// HTTP status code
        status: u16,
        /// Body of the error response
        message: String,
    },

    /// The request never produced a response (connection refused, timeout, TLS)
    #[error("{interface}.{method} could not reach {host}: {reason}")]
    Transport {
        interface: &'static str,
        method: &'static str,
        host: String,
        reason: String,
    },

    /// The response body was not the expected shape
    #[error("{interface}.{method} returned an undecodable payload from {host}: {reason}")]
    Decode {
        interface: &'static str,
        method: &'static str,
        host: String,
        reason: String,
    },

    /// A bulk getter returned a different number of entries than requested
    #[error("{interface}.{method} returned {actual} entries for {expected} objects")]
    LengthMismatch {
        interface: &'static str,
        method: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A device constant could not be mapped to a known value
    #[error(transparent)]
    UnknownValue(#[from] UnknownVariant),
}

/// Contract violations detected before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A monitor string property is not valid for the monitor's current type
    #[error("cannot set '{property}' on monitor '{monitor}' as its type is currently {monitor_type}")]
    StringPropertyNotAllowed {
        monitor: String,
        property: String,
        monitor_type: String,
    },

    /// An iRule declaration carries neither content nor a template
    #[error("iRule '{rule}' requires either 'content' or 'template'")]
    MissingRuleDefinition { rule: String },

    /// An address class key is not `address` or `address/netmask`
    #[error("address class '{class}' has an invalid key '{key}'")]
    InvalidClassKey { class: String, key: String },

    /// A declaration is internally inconsistent
    #[error("invalid declaration for '{resource}': {reason}")]
    InvalidDeclaration { resource: String, reason: String },
}

/// Failure converging a single resource.
///
/// Every variant identifies the resource; remote failures also name the
/// operation that was being attempted.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A remote call failed while converging the resource
    #[error("{kind} '{name}': {operation} failed: {source}")]
    Remote {
        kind: ResourceKind,
        name: String,
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    /// The declaration violates a contract of the remote API
    #[error("{kind} '{name}': {source}")]
    Contract {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ContractError,
    },

    /// The object could not be found on reload right after it was created
    #[error("{kind} '{name}' was not found after it was created")]
    MissingAfterCreate { kind: ResourceKind, name: String },
}

impl ReconcileError {
    /// Wrap a remote failure with the resource and operation being attempted.
    pub fn remote(
        kind: ResourceKind,
        name: impl Into<String>,
        operation: &'static str,
        source: RemoteError,
    ) -> Self {
        Self::Remote {
            kind,
            name: name.into(),
            operation,
            source,
        }
    }

    /// Wrap a contract violation with the resource it was raised for.
    pub fn contract(kind: ResourceKind, name: impl Into<String>, source: ContractError) -> Self {
        Self::Contract {
            kind,
            name: name.into(),
            source,
        }
    }

    /// The kind of resource that failed.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Remote { kind, .. }
            | Self::Contract { kind, .. }
            | Self::MissingAfterCreate { kind, .. } => *kind,
        }
    }

    /// Whether this is a contract violation rather than a remote-state failure.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Contract { .. })
    }
}
