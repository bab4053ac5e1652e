// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolution of a service to a live pod that can be port-forwarded to

use crate::constants::SERVICE_PORT;
use crate::error::TransportError;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{api::ListParams, Api, Client, ResourceExt};
use tracing::{debug, instrument};

/// A running pod behind a service and the container port the service targets on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingPod {
    pub name: String,
    pub port: u16,
}

/// Find a running pod selected by `service`
#[instrument(skip(client))]
pub async fn find_backing_pod(
    client: &Client,
    namespace: &str,
    service: &str,
) -> Result<BackingPod, TransportError> {
    let no_pod = || TransportError::NoBackingPod {
        namespace: namespace.to_string(),
        service: service.to_string(),
    };

    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    let svc = match services.get(service).await {
        Ok(svc) => svc,
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("Service {}/{} not found", namespace, service);
            return Err(no_pod());
        }
        Err(e) => return Err(e.into()),
    };

    let spec = svc.spec.unwrap_or_default();
    let selector = spec.selector.unwrap_or_default();
    if selector.is_empty() {
        debug!("Service {}/{} has no selector", namespace, service);
        return Err(no_pod());
    }

    let label_selector = selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");
    let target_port = spec
        .ports
        .unwrap_or_default()
        .into_iter()
        .find(|p| p.port == i32::from(SERVICE_PORT))
        .and_then(|p| p.target_port);

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod_list = pods.list(&ListParams::default().labels(&label_selector)).await?;

    let pod = pod_list
        .items
        .into_iter()
        .find(is_running)
        .ok_or_else(no_pod)?;

    let port = resolve_port(&pod, target_port.as_ref());
    debug!("Service {}/{} is backed by pod {} port {}", namespace, service, pod.name_any(), port);

    Ok(BackingPod {
        name: pod.name_any(),
        port,
    })
}

fn is_running(pod: &Pod) -> bool {
    pod.metadata.deletion_timestamp.is_none()
        && pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| phase == "Running")
}

/// Map a service targetPort onto a container port of `pod`.
/// Named ports are looked up among the pod's containers.
fn resolve_port(pod: &Pod, target_port: Option<&IntOrString>) -> u16 {
    match target_port {
        Some(IntOrString::Int(port)) => u16::try_from(*port).unwrap_or(SERVICE_PORT),
        Some(IntOrString::String(name)) => pod
            .spec
            .iter()
            .flat_map(|s| s.containers.iter())
            .flat_map(|c| c.ports.iter().flatten())
            .find(|p| p.name.as_deref() == Some(name.as_str()))
            .and_then(|p| u16::try_from(p.container_port).ok())
            .unwrap_or(SERVICE_PORT),
        None => SERVICE_PORT,
    }
}
