// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Runtime configuration and declaration loading.
//!
//! Connection settings come from an optional `ltmsync.yaml`:
//!
//! ```yaml
//! scheme: https
//! port: 443
//! timeout_secs: 30
//! accept_invalid_certs: false
//! credentials:
//!   default:
//!     username: automation
//!     password: secret
//!   hosts:
//!     lb2.example.com:
//!       username: admin
//!       password: other
//! ```
//!
//! Declaration files list one entry per device. Paths inside them (iRule
//! templates, certificate and key files) are resolved relative to the
//! declaration file and read into the declaration before any device is
//! contacted.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::constants::{DEFAULT_API_PORT, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCHEME};
use crate::icontrol::ConnectionSettings;
use crate::provisioner::DeviceDeclaration;

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Username and password for the management API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Default credentials plus per-host overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialStore {
    #[serde(default)]
    pub default: Option<Credentials>,

    #[serde(default)]
    pub hosts: BTreeMap<String, Credentials>,
}

/// Connection configuration shared by every device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification (self-signed management certificates)
    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub credentials: CredentialStore,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
            credentials: CredentialStore::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or use defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Override the default credentials field by field.
    ///
    /// A username without a password (or the reverse) only replaces that
    /// field of an existing default entry.
    pub fn override_default_credentials(
        &mut self,
        username: Option<String>,
        password: Option<String>,
    ) {
        if username.is_none() && password.is_none() {
            return;
        }
        let current = self.credentials.default.take();
        let (old_username, old_password) = current
            .map(|c| (c.username, c.password))
            .unwrap_or_default();
        self.credentials.default = Some(Credentials {
            username: username.unwrap_or(old_username),
            password: password.unwrap_or(old_password),
        });
    }

    /// Credentials for `hostname`: its own entry, else the default.
    ///
    /// # Errors
    ///
    /// Returns an error if neither exists or the chosen entry has no username.
    pub fn credentials_for(&self, hostname: &str) -> Result<&Credentials> {
        let credentials = self
            .credentials
            .hosts
            .get(hostname)
            .or(self.credentials.default.as_ref())
            .ok_or_else(|| anyhow!("No credentials configured for {hostname}"))?;
        if credentials.username.is_empty() {
            return Err(anyhow!("Credentials for {hostname} have an empty username"));
        }
        Ok(credentials)
    }

    /// Connection settings for one device.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials apply to `hostname`.
    pub fn connection_settings(&self, hostname: &str) -> Result<ConnectionSettings> {
        let credentials = self.credentials_for(hostname)?;
        Ok(ConnectionSettings {
            scheme: self.scheme.clone(),
            port: self.port,
            timeout: Duration::from_secs(self.timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs,
            ..ConnectionSettings::new(hostname, &credentials.username, &credentials.password)
        })
    }
}

/// Resolve `path` against the directory holding the declaration file.
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

async fn read_referenced(base: &Path, path: &Path, what: &str, owner: &str) -> Result<String> {
    let full = resolve(base, path);
    tokio::fs::read_to_string(&full)
        .await
        .with_context(|| format!("Failed to read {what} {} for '{owner}'", full.display()))
}

/// Read every file a declaration refers to into the declaration itself.
///
/// iRule templates fill `content` unless it is already set; certificate and
/// key files fill `cert` and `key`.
///
/// # Errors
///
/// Returns an error naming the file and the resource if a file cannot be read.
pub async fn resolve_references(declaration: &mut DeviceDeclaration, base: &Path) -> Result<()> {
    for rule in &mut declaration.create.irules {
        if rule.content.is_some() {
            continue;
        }
        if let Some(template) = &rule.template {
            let content = read_referenced(base, template, "iRule template", &rule.name).await?;
            rule.content = Some(content);
        }
    }

    for cert in &mut declaration.create.ssl_certs {
        if let Some(file) = &cert.cert_file {
            cert.cert = read_referenced(base, file, "certificate", &cert.name).await?;
        }
        if let Some(file) = &cert.key_file {
            cert.key = read_referenced(base, file, "key", &cert.name).await?;
        }
    }

    Ok(())
}

/// Load a declaration file: a YAML list of device declarations.
///
/// # Errors
///
/// Returns an error if the file or any file it references cannot be read, or
/// if the YAML does not describe device declarations.
pub async fn load_declarations(path: &Path) -> Result<Vec<DeviceDeclaration>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read declarations {}", path.display()))?;
    let mut declarations: Vec<DeviceDeclaration> = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse declarations {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for declaration in &mut declarations {
        resolve_references(declaration, base)
            .await
            .with_context(|| format!("Invalid declaration for {}", declaration.hostname))?;
    }

    debug!(
        path = %path.display(),
        devices = declarations.len(),
        "Loaded declarations"
    );
    Ok(declarations)
}
