// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Failures reaching the cost-analyzer, through either the API server proxy or a tunnel
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("no running pod backs service {namespace}/{service}")]
    NoBackingPod { namespace: String, service: String },

    #[error("failed to bind local port: {0}")]
    Bind(#[source] std::io::Error),

    #[error("tunnel to pod {pod} failed to become ready: {reason}")]
    NotReady { pod: String, reason: String },

    #[error("tunnel closed before becoming ready")]
    TunnelClosed,

    #[error("query timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("query cancelled")]
    Cancelled,

    #[error("{endpoint} returned HTTP {status}; data: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// A response body that could not be unmarshalled into its result model
#[derive(Error, Debug)]
#[error("failed to unmarshal {endpoint} response: {source}; data: {excerpt}")]
pub struct DecodeError {
    pub endpoint: String,
    pub excerpt: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid quantity {input:?}: {reason}")]
pub struct QuantityError {
    pub input: String,
    pub reason: &'static str,
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("decoding file data as K8s object: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("object has no apiVersion/kind")]
    MissingTypeInfo,

    #[error("decoding {kind} {name}: {source}")]
    Typed {
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum CostError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("unsupported type: {kind} ({name})")]
    UnsupportedKind { kind: String, name: String },

    #[error("prediction query for {workload} failed: {source}")]
    Prediction {
        workload: String,
        #[source]
        source: Box<CostError>,
    },
}

pub type Result<T> = std::result::Result<T, CostError>;
