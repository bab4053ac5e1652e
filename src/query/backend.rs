// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Raw GET requests against the in-cluster cost-model.
//!
//! Requests travel either through the API server's service proxy or through
//! a port-forward tunnel opened for that one request.

use super::params::QueryParams;
use crate::config::BackendConfig;
use crate::constants::SERVICE_PORT;
use crate::error::TransportError;
use crate::kubernetes::PortForwardSession;
use bytes::Bytes;
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// How requests reach the cost-model service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `/api/v1/namespaces/{ns}/services/{svc}:{port}/proxy/...` on the API server
    Proxy,
    /// Plain HTTP to a local port forwarded to a backing pod
    Tunnel,
}

impl Transport {
    pub fn for_config(config: &BackendConfig) -> Self {
        if config.use_proxy {
            Transport::Proxy
        } else {
            Transport::Tunnel
        }
    }
}

pub struct QueryBackend {
    client: Client,
    config: BackendConfig,
    http: reqwest::Client,
    cancel: CancellationToken,
}

impl QueryBackend {
    pub fn new(client: Client, config: BackendConfig) -> Self {
        Self {
            client,
            config,
            http: reqwest::Client::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future queries once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn transport(&self) -> Transport {
        Transport::for_config(&self.config)
    }

    /// GET `endpoint` with `params` and return the raw response body.
    /// Any tunnel opened for the request is closed before this returns,
    /// whether it succeeded, failed, timed out or was cancelled.
    #[instrument(skip(self, params), fields(transport = ?self.transport()))]
    pub async fn query(&self, endpoint: &str, params: &QueryParams) -> Result<Bytes, TransportError> {
        let timeout = self.config.timeout;
        let request = async {
            match self.transport() {
                Transport::Proxy => self.proxy_get(endpoint, params).await,
                Transport::Tunnel => self.tunnel_get(endpoint, params).await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransportError::Cancelled),
            result = tokio::time::timeout(timeout, request) => {
                result.unwrap_or(Err(TransportError::Timeout(timeout)))
            }
        }
    }

    async fn proxy_get(&self, endpoint: &str, params: &QueryParams) -> Result<Bytes, TransportError> {
        let path = proxy_path(&self.config, endpoint, params);
        debug!("Proxying GET {}", path);

        let request = http::Request::builder()
            .method("GET")
            .uri(&path)
            .body(Body::from(Vec::new()))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let response = self.client.send(request).await?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_bytes();

        check_status(endpoint, status.as_u16(), body)
    }

    async fn tunnel_get(&self, endpoint: &str, params: &QueryParams) -> Result<Bytes, TransportError> {
        let mut session = PortForwardSession::open(&self.client, &self.config).await?;
        session.ready().await?;

        let url = session.url(endpoint, params)?;
        debug!("Tunneled GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        session.close();

        check_status(endpoint, status.as_u16(), body)
    }
}

fn check_status(endpoint: &str, status: u16, body: Bytes) -> Result<Bytes, TransportError> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(TransportError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// API server path proxying `endpoint` on the cost-model service
pub fn proxy_path(config: &BackendConfig, endpoint: &str, params: &QueryParams) -> String {
    let mut path = format!(
        "/api/v1/namespaces/{}/services/{}:{}/proxy/{}",
        config.namespace,
        config.service_name,
        SERVICE_PORT,
        endpoint.trim_start_matches('/')
    );
    let query = params.to_query_string();
    if !query.is_empty() {
        path.push('?');
        path.push_str(&query);
    }
    path
}
