// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation from the local kubeconfig

use crate::error::TransportError;
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::{debug, instrument};

/// Create a client for the cluster the cost-model runs in.
/// An explicit `context` is looked up in the kubeconfig; otherwise the
/// configuration is inferred (in-cluster, then `KUBECONFIG`/default file).
#[instrument]
pub async fn create_client(context: Option<&str>) -> Result<Client, TransportError> {
    let config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            KConfig::from_kubeconfig(&options).await.map_err(|e| {
                TransportError::Kubeconfig(format!("Failed to load context {}: {}", context, e))
            })?
        }
        None => KConfig::infer()
            .await
            .map_err(|e| TransportError::Kubeconfig(format!("Failed to infer config: {}", e)))?,
    };

    debug!("Using cluster {}", config.cluster_url);

    Client::try_from(config)
        .map_err(|e| TransportError::Kubeconfig(format!("Failed to create client: {}", e)))
}
