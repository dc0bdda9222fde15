// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! JSON-over-HTTP transport for the management API.
//!
//! Every call is a `POST {base}/iControl/{Interface}/{method}` carrying a JSON
//! object of named parameters. The device answers with `{"result": ...}`.
//! Failures are mapped to [`RemoteError`] and are never retried.

use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;

use crate::constants::{
    DEFAULT_API_PORT, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCHEME, RPC_PATH_PREFIX,
};
use crate::errors::RemoteError;

/// Everything needed to open a connection to one device.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub scheme: String,
    pub port: u16,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl ConnectionSettings {
    /// Settings with the default scheme, port and timeout.
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            scheme: DEFAULT_SCHEME.to_string(),
            port: DEFAULT_API_PORT,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            accept_invalid_certs: false,
        }
    }

    /// Base URL of the management API, e.g. `https://lb1:443`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme, host and port do not form a valid URL.
    pub fn base_url(&self) -> Result<Url> {
        let raw = format!("{}://{}:{}", self.scheme, self.hostname, self.port);
        Url::parse(&raw).with_context(|| format!("Invalid management API address {raw}"))
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scheme", &self.scheme)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[derive(Deserialize)]
struct RpcEnvelope<R> {
    result: R,
}

/// Management API client for one device.
///
/// Implements every service trait in [`super::services`]; wrap it with
/// [`super::Remote::from_client`] to obtain the typed facade.
#[derive(Clone)]
pub struct RpcClient {
    /// HTTP client for API requests
    client: Arc<HttpClient>,
    /// API base URL without a trailing slash
    base_url: String,
    /// Device hostname, used in errors and logs
    host: String,
    username: String,
    password: Arc<String>,
}

impl RpcClient {
    /// Create a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        let base_url = settings.base_url()?;
        let client = HttpClient::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            host: settings.hostname.clone(),
            username: settings.username.clone(),
            password: Arc::new(settings.password.clone()),
        })
    }

    /// Hostname this client talks to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL of one interface method.
    pub(crate) fn endpoint(&self, interface: &str, method: &str) -> String {
        format!("{}/{RPC_PATH_PREFIX}/{interface}/{method}", self.base_url)
    }

    /// Invoke `interface.method` with named parameters and decode its result.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::Transport`] when no response was received
    /// - [`RemoteError::CallFailed`] for a non-success HTTP status
    /// - [`RemoteError::Decode`] when the body is not `{"result": R}`
    pub(crate) async fn call<P, R>(
        &self,
        interface: &'static str,
        method: &'static str,
        params: &P,
    ) -> Result<R, RemoteError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let text = self.post(interface, method, params).await?;
        serde_json::from_str::<RpcEnvelope<R>>(&text)
            .map(|envelope| envelope.result)
            .map_err(|e| RemoteError::Decode {
                interface,
                method,
                host: self.host.clone(),
                reason: e.to_string(),
            })
    }

    /// Invoke a mutating `interface.method` whose result carries no data.
    ///
    /// # Errors
    ///
    /// Same transport and status errors as [`RpcClient::call`]; the body is ignored.
    pub(crate) async fn invoke<P>(
        &self,
        interface: &'static str,
        method: &'static str,
        params: &P,
    ) -> Result<(), RemoteError>
    where
        P: Serialize + ?Sized,
    {
        self.post(interface, method, params).await.map(|_| ())
    }

    async fn post<P>(
        &self,
        interface: &'static str,
        method: &'static str,
        params: &P,
    ) -> Result<String, RemoteError>
    where
        P: Serialize + ?Sized,
    {
        let url = self.endpoint(interface, method);
        let start = Instant::now();
        debug!(device = %self.host, interface, method, "management API request");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(self.password.as_str()))
            .json(params)
            .send()
            .await
            .map_err(|e| self.transport_error(interface, method, &e))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                device = %self.host,
                interface,
                method,
                status = %status,
                error = %error_text,
                "management API request failed"
            );
            return Err(RemoteError::CallFailed {
                interface,
                method,
                host: self.host.clone(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(interface, method, &e))?;

        debug!(
            device = %self.host,
            interface,
            method,
            status = %status,
            response_len = text.len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "management API request successful"
        );

        Ok(text)
    }

    fn transport_error(
        &self,
        interface: &'static str,
        method: &'static str,
        error: &reqwest::Error,
    ) -> RemoteError {
        RemoteError::Transport {
            interface,
            method,
            host: self.host.clone(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
