// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ephemeral local port-forward tunnels to a pod behind a service.
//!
//! A session binds `127.0.0.1:0`, relays every accepted connection to the
//! pod over the API server's portforward subresource, and tears the relay
//! down when dropped. Sessions are opened for a single request and never
//! shared.

use super::pods::find_backing_pod;
use crate::config::BackendConfig;
use crate::error::TransportError;
use crate::query::QueryParams;
use k8s_openapi::api::core::v1::Pod;
use kube::api::Portforwarder;
use kube::{Api, Client};
use std::net::Ipv4Addr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, instrument, warn};
use url::Url;

type ReadySignal = oneshot::Receiver<Result<(), String>>;

/// Aborts the relay task, and every connection it spawned, when dropped
#[derive(Debug)]
struct RelayGuard(JoinHandle<()>);

impl RelayGuard {
    #[cfg(test)]
    fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.0.abort_handle()
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One live tunnel from an ephemeral local port to a pod
#[derive(Debug)]
pub struct PortForwardSession {
    pub namespace: String,
    pub pod: String,
    pub remote_port: u16,
    pub local_port: u16,
    ready: Option<ReadySignal>,
    relay: RelayGuard,
}

impl PortForwardSession {
    /// Pick a running pod behind the configured service and start relaying to it.
    /// The tunnel is usable once [`ready`](Self::ready) returns.
    #[instrument(skip(client, config), fields(service = %config.service_name))]
    pub async fn open(client: &Client, config: &BackendConfig) -> Result<Self, TransportError> {
        let target = find_backing_pod(client, &config.namespace, &config.service_name).await?;

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(TransportError::Bind)?;
        let local_port = listener.local_addr().map_err(TransportError::Bind)?.port();

        let pods: Api<Pod> = Api::namespaced(client.clone(), &config.namespace);
        let (ready_tx, ready_rx) = oneshot::channel();
        let relay = tokio::spawn(relay(
            pods,
            target.name.clone(),
            target.port,
            listener,
            ready_tx,
        ));

        debug!(
            "Forwarding 127.0.0.1:{} to {}/{}:{}",
            local_port, config.namespace, target.name, target.port
        );

        Ok(Self {
            namespace: config.namespace.clone(),
            pod: target.name,
            remote_port: target.port,
            local_port,
            ready: Some(ready_rx),
            relay: RelayGuard(relay),
        })
    }

    /// Wait until the tunnel to the pod is established
    pub async fn ready(&mut self) -> Result<(), TransportError> {
        let Some(signal) = self.ready.take() else {
            return Ok(());
        };
        match signal.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(TransportError::NotReady {
                pod: self.pod.clone(),
                reason,
            }),
            Err(_) => Err(TransportError::TunnelClosed),
        }
    }

    /// URL of `endpoint` on the local end of the tunnel
    pub fn url(&self, endpoint: &str, params: &QueryParams) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!(
            "http://127.0.0.1:{}/{}",
            self.local_port,
            endpoint.trim_start_matches('/')
        ))
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(params.iter());
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    /// Tear the tunnel down. Dropping the session does the same.
    pub fn close(self) {
        debug!("Closing tunnel to {}/{}", self.namespace, self.pod);
    }

    #[cfg(test)]
    fn relay_handle(&self) -> tokio::task::AbortHandle {
        self.relay.abort_handle()
    }
}

async fn relay(
    pods: Api<Pod>,
    pod: String,
    port: u16,
    listener: TcpListener,
    ready: oneshot::Sender<Result<(), String>>,
) {
    let mut forwarder = match pods.portforward(&pod, &[port]).await {
        Ok(forwarder) => {
            let _ = ready.send(Ok(()));
            Some(forwarder)
        }
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    // Owned here so aborting the relay aborts in-flight connections too
    let mut connections = JoinSet::new();
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Tunnel listener failed: {}", e);
                return;
            }
        };
        debug!("Tunnel connection from {}", peer);

        let forwarder = match forwarder.take() {
            Some(forwarder) => forwarder,
            None => match pods.portforward(&pod, &[port]).await {
                Ok(forwarder) => forwarder,
                Err(e) => {
                    warn!("Failed to open port-forward to {}: {}", pod, e);
                    continue;
                }
            },
        };
        connections.spawn(forward_connection(forwarder, port, socket));
    }
}

async fn forward_connection(mut forwarder: Portforwarder, port: u16, mut socket: TcpStream) {
    let Some(mut upstream) = forwarder.take_stream(port) else {
        warn!("Port-forward has no stream for port {}", port);
        return;
    };
    if let Err(e) = tokio::io::copy_bidirectional(&mut socket, &mut upstream).await {
        debug!("Tunnel connection ended: {}", e);
    }
    drop(upstream);
    if let Err(e) = forwarder.join().await {
        debug!("Port-forward finished with error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::AbortHandle;
    use crate::test_utils::{pod_list_json, service_json, MockService};
    use std::time::Duration;

    async fn wait_finished(handle: &AbortHandle) -> bool {
        for _ in 0..100 {
            if handle.is_finished() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn mock_with_pods(pods: &[(&str, &str)]) -> MockService {
        MockService::new()
            .on_get(
                "/api/v1/namespaces/kubecost/services/kubecost-cost-analyzer",
                200,
                &service_json("kubecost-cost-analyzer", Some(9090)),
            )
            .on_get("/api/v1/namespaces/kubecost/pods", 200, &pod_list_json(pods))
    }

    #[tokio::test]
    async fn test_dropping_guard_aborts_relay() {
        let guard = RelayGuard(tokio::spawn(std::future::pending::<()>()));
        let handle = guard.abort_handle();
        assert!(!handle.is_finished());

        drop(guard);
        assert!(wait_finished(&handle).await);
    }

    #[tokio::test]
    async fn test_open_without_pod_spawns_nothing() {
        let mock = mock_with_pods(&[]);
        let err = PortForwardSession::open(&mock.client(), &BackendConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::NoBackingPod { .. }));
        assert!(!mock.requests().iter().any(|r| r.contains("portforward")));
    }

    #[tokio::test]
    async fn test_failed_upgrade_is_not_ready_and_releases_relay() {
        let mock = mock_with_pods(&[("cost-model-0", "Running")]);
        let mut session = PortForwardSession::open(&mock.client(), &BackendConfig::default())
            .await
            .unwrap();
        assert_eq!(session.pod, "cost-model-0");
        assert_ne!(session.local_port, 0);

        let err = session.ready().await.unwrap_err();
        assert!(matches!(err, TransportError::NotReady { .. }));

        let handle = session.relay_handle();
        session.close();
        assert!(wait_finished(&handle).await);
    }

    #[tokio::test]
    async fn test_local_url() {
        let mock = mock_with_pods(&[("cost-model-0", "Running")]);
        let session = PortForwardSession::open(&mock.client(), &BackendConfig::default())
            .await
            .unwrap();

        let params = QueryParams::new().with("window", "2d");
        let url = session.url("/model/currencyCode", &params).unwrap();
        assert_eq!(
            url.as_str(),
            format!("http://127.0.0.1:{}/model/currencyCode?window=2d", session.local_port)
        );

        let bare = session.url("model/currencyCode", &QueryParams::new()).unwrap();
        assert_eq!(bare.query(), None);
    }
}
