// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SSL certificate and key reconciliation.
//!
//! Certificate and key are stored under the same qualified name and tracked
//! independently. Only presence is checked: existing material is replaced
//! only when the declaration sets `override`, and then on every pass.
//!
//! PEM content never reaches logs or debug output; a SHA-256 fingerprint is
//! shown instead.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fmt;
use std::slice;
use std::time::Instant;
use tracing::{debug, info};

use super::{apply_actions, finish, ReconcileOutcome, RemoteMutation, RemoteResultExt};
use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, ResourceKind};
use crate::icontrol::types::ManagementMode;
use crate::icontrol::{Remote, RemoteResult};
use crate::resources::SslCertSpec;

const KIND: ResourceKind = ResourceKind::SslCert;

/// Hex SHA-256 digest of PEM material.
#[must_use]
pub fn fingerprint(pem: &str) -> String {
    format!("{:x}", Sha256::digest(pem.as_bytes()))
}

/// Remote mutations on certificates and keys.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum SslAction {
    ImportCertificate {
        mode: ManagementMode,
        id: String,
        pem: String,
        overwrite: bool,
    },
    ImportKey {
        mode: ManagementMode,
        id: String,
        pem: String,
        overwrite: bool,
    },
    DeleteCertificate {
        mode: ManagementMode,
        id: String,
    },
    DeleteKey {
        mode: ManagementMode,
        id: String,
    },
}

impl fmt::Debug for SslAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImportCertificate {
                mode,
                id,
                pem,
                overwrite,
            }
            | Self::ImportKey {
                mode,
                id,
                pem,
                overwrite,
            } => f
                .debug_struct(self.operation())
                .field("mode", mode)
                .field("id", id)
                .field("fingerprint", &fingerprint(pem))
                .field("overwrite", overwrite)
                .finish(),
            Self::DeleteCertificate { mode, id } | Self::DeleteKey { mode, id } => f
                .debug_struct(self.operation())
                .field("mode", mode)
                .field("id", id)
                .finish(),
        }
    }
}

#[async_trait]
impl RemoteMutation for SslAction {
    fn operation(&self) -> &'static str {
        match self {
            Self::ImportCertificate { .. } => "import certificate",
            Self::ImportKey { .. } => "import key",
            Self::DeleteCertificate { .. } => "delete certificate",
            Self::DeleteKey { .. } => "delete key",
        }
    }

    async fn execute(&self, remote: &Remote) -> RemoteResult<()> {
        let api = &remote.certificates;
        match self {
            Self::ImportCertificate {
                mode,
                id,
                pem,
                overwrite,
            } => {
                api.certificate_import_from_pem(
                    *mode,
                    slice::from_ref(id),
                    slice::from_ref(pem),
                    *overwrite,
                )
                .await
            }
            Self::ImportKey {
                mode,
                id,
                pem,
                overwrite,
            } => {
                api.key_import_from_pem(*mode, slice::from_ref(id), slice::from_ref(pem), *overwrite)
                    .await
            }
            Self::DeleteCertificate { mode, id } => {
                api.certificate_delete(*mode, slice::from_ref(id)).await
            }
            Self::DeleteKey { mode, id } => api.key_delete(*mode, slice::from_ref(id)).await,
        }
    }
}

/// Imports needed for `desired`, given which artifacts exist under `id`.
///
/// An empty certificate or key in the declaration is not managed.
pub(crate) fn plan_ssl_cert(
    desired: &SslCertSpec,
    id: &str,
    cert_exists: bool,
    key_exists: bool,
) -> Vec<SslAction> {
    let overwrite = desired.override_existing;
    let mut actions = Vec::new();

    if !desired.cert.is_empty() && (!cert_exists || overwrite) {
        actions.push(SslAction::ImportCertificate {
            mode: desired.mode,
            id: id.to_string(),
            pem: desired.cert.clone(),
            overwrite,
        });
    }
    if !desired.key.is_empty() && (!key_exists || overwrite) {
        actions.push(SslAction::ImportKey {
            mode: desired.mode,
            id: id.to_string(),
            pem: desired.key.clone(),
            overwrite,
        });
    }

    actions
}

/// Which of certificate and key exist under `id`.
async fn presence(
    device: &LoadBalancer,
    mode: ManagementMode,
    id: &str,
    name: &str,
) -> Result<(bool, bool), ReconcileError> {
    let api = &device.remote().certificates;
    let certs = api
        .get_certificate_list(mode)
        .await
        .during(KIND, name, "list certificates")?;
    let keys = api
        .get_key_list(mode)
        .await
        .during(KIND, name, "list keys")?;
    Ok((certs.iter().any(|c| c == id), keys.iter().any(|k| k == id)))
}

/// Converge a certificate/key pair to its declaration.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn reconcile_ssl_cert(
    device: &mut LoadBalancer,
    desired: &SslCertSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge(device, desired).await;
    finish(device, started, result)
}

async fn converge(
    device: &mut LoadBalancer,
    desired: &SslCertSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let name = desired.name.as_str();
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;
    let id = device.qualify(name);

    let (cert_exists, key_exists) = presence(device, desired.mode, &id, name).await?;
    let actions = plan_ssl_cert(desired, &id, cert_exists, key_exists);

    for action in &actions {
        if let SslAction::ImportCertificate { pem, .. } | SslAction::ImportKey { pem, .. } = action
        {
            info!(
                device = %device.hostname(),
                name,
                operation = action.operation(),
                fingerprint = %fingerprint(pem),
                "Importing PEM material"
            );
        }
    }
    apply_actions(device, &actions, &mut outcome).await?;

    Ok(outcome)
}

/// Delete whichever of certificate and key exist under `name`.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn delete_ssl_cert(
    device: &mut LoadBalancer,
    name: &str,
    mode: ManagementMode,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = remove(device, name, mode).await;
    finish(device, started, result)
}

async fn remove(
    device: &mut LoadBalancer,
    name: &str,
    mode: ManagementMode,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;
    let id = device.qualify(name);

    let (cert_exists, key_exists) = presence(device, mode, &id, name).await?;
    let mut actions = Vec::new();
    if cert_exists {
        actions.push(SslAction::DeleteCertificate {
            mode,
            id: id.clone(),
        });
    }
    if key_exists {
        actions.push(SslAction::DeleteKey { mode, id });
    }
    if actions.is_empty() {
        debug!(device = %device.hostname(), name, "Certificate and key already absent");
    }

    apply_actions(device, &actions, &mut outcome).await?;
    Ok(outcome)
}
