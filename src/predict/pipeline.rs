// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cost prediction for a batch of workload manifests.
//!
//! Workloads are handled one at a time, in order. A failed prediction or an
//! unsupported kind aborts the batch; daemon sets and claims without a
//! storage request are skipped with a warning.

use super::manifest::Workload;
use crate::constants::UNKNOWN_STORAGE_CLASS;
use crate::error::{CostError, Result};
use crate::query::{
    query_currency_code, query_predict_resource_cost, QueryBackend, QueryParams,
    ResourceCostPrediction,
};
use crate::resources::{sum_container_resources, Quantity, ResourceTotals};
use k8s_openapi::api::core::v1::{Container, PersistentVolumeClaim, PodSpec};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictOptions {
    /// Window of cost data the unit prices are derived from, e.g. `2d`
    pub window: String,
    /// Cluster whose prices apply; all clusters when unset
    pub cluster_id: Option<String>,
}

/// What a workload asks the cluster for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Demand {
    Compute(ResourceTotals),
    Storage { class: String, quantity: Quantity },
}

/// One predicted workload
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadRow {
    pub name: String,
    pub kind: String,
    pub cpu: String,
    pub memory: String,
    pub gpu: String,
    pub storage: Option<String>,
    pub storage_class: Option<String>,
    pub prediction: ResourceCostPrediction,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionReport {
    pub rows: Vec<WorkloadRow>,
    /// Empty when the cost-model couldn't tell
    pub currency_code: String,
}

fn replicas_or_default(replicas: Option<i32>, kind: &str, name: &str) -> u32 {
    match replicas {
        Some(r) => u32::try_from(r).unwrap_or(0),
        None => {
            warn!("replicas is nil for {}/{}, defaulting to 1", kind, name);
            1
        }
    }
}

fn containers(spec: Option<&PodSpec>) -> &[Container] {
    spec.map(|s| s.containers.as_slice()).unwrap_or_default()
}

fn storage_demand(pvc: &PersistentVolumeClaim, name: &str) -> Result<Option<Demand>> {
    let spec = pvc.spec.as_ref();

    let class = match spec.and_then(|s| s.storage_class_name.clone()) {
        Some(class) => class,
        None => {
            warn!("PersistentVolumeClaim {} has no storage class, reporting it as unknown", name);
            UNKNOWN_STORAGE_CLASS.to_string()
        }
    };

    let requested = spec
        .and_then(|s| s.resources.as_ref())
        .and_then(|r| r.requests.as_ref())
        .and_then(|r| r.get("storage"));
    let Some(requested) = requested else {
        warn!(
            "Cannot predict storage cost for a PVC ({}) with no requested storage. Skipping.",
            name
        );
        return Ok(None);
    };

    Ok(Some(Demand::Storage {
        class,
        quantity: Quantity::try_from(requested)?,
    }))
}

/// Work out what `workload` demands. `None` means it is skipped.
pub fn classify(workload: &Workload) -> Result<Option<Demand>> {
    let kind = workload.kind();
    let name = workload.name();

    let demand = match workload {
        Workload::Deployment(d) => {
            let spec = d.spec.as_ref();
            let replicas = replicas_or_default(spec.and_then(|s| s.replicas), kind, &name);
            let pod_spec = spec.and_then(|s| s.template.spec.as_ref());
            Demand::Compute(sum_container_resources(replicas, containers(pod_spec))?)
        }
        Workload::StatefulSet(s) => {
            let spec = s.spec.as_ref();
            let replicas = replicas_or_default(spec.and_then(|s| s.replicas), kind, &name);
            let pod_spec = spec.and_then(|s| s.template.spec.as_ref());
            Demand::Compute(sum_container_resources(replicas, containers(pod_spec))?)
        }
        Workload::Pod(p) => Demand::Compute(sum_container_resources(1, containers(p.spec.as_ref()))?),
        Workload::DaemonSet(_) => {
            warn!(
                "DaemonSets are not supported because scheduling-dependent workloads are not yet supported. Skipping {}/{}.",
                kind, name
            );
            return Ok(None);
        }
        Workload::PersistentVolumeClaim(pvc) => return storage_demand(pvc, &name),
        Workload::Other { kind, name } => {
            return Err(CostError::UnsupportedKind {
                kind: kind.clone(),
                name: name.clone(),
            })
        }
    };

    Ok(Some(demand))
}

impl Demand {
    /// Parameters for the prediction query of this demand
    pub fn query_params(&self, options: &PredictOptions) -> QueryParams {
        let params = QueryParams::new()
            .with("window", &options.window)
            .with_opt("clusterID", options.cluster_id.as_deref());

        match self {
            Demand::Compute(totals) => params
                .with("requestedCPU", totals.cpu.to_string())
                .with("requestedMemory", totals.memory.to_string())
                .with_opt("requestedGPU", totals.gpu.map(|g| g.to_string())),
            Demand::Storage { class, quantity } => params
                .with("requestedStorage", quantity.to_string())
                .with("storageClass", class),
        }
    }

    fn into_row(self, workload: &Workload, prediction: ResourceCostPrediction) -> WorkloadRow {
        let (cpu, memory, gpu, storage, storage_class) = match self {
            Demand::Compute(totals) => (
                totals.cpu.to_string(),
                totals.memory.to_string(),
                totals.gpu.map_or_else(|| "0".to_string(), |g| g.to_string()),
                None,
                None,
            ),
            Demand::Storage { class, quantity } => (
                "0".to_string(),
                "0".to_string(),
                "0".to_string(),
                Some(quantity.to_string()),
                Some(class),
            ),
        };

        WorkloadRow {
            name: workload.name(),
            kind: workload.kind().to_string(),
            cpu,
            memory,
            gpu,
            storage,
            storage_class,
            prediction,
        }
    }
}

/// Predict the monthly cost of every supported workload, then look up the
/// currency the costs are expressed in.
#[instrument(skip_all, fields(workloads = workloads.len()))]
pub async fn predict_workloads(
    backend: &QueryBackend,
    workloads: &[Workload],
    options: &PredictOptions,
) -> Result<PredictionReport> {
    let mut rows = Vec::new();

    for workload in workloads {
        let Some(demand) = classify(workload)? else {
            continue;
        };

        let params = demand.query_params(options);
        let prediction = query_predict_resource_cost(backend, &params)
            .await
            .map_err(|e| CostError::Prediction {
                workload: format!("{}/{}", workload.kind(), workload.name()),
                source: Box::new(e),
            })?;
        info!(
            "Predicted {}/{} at {:.2}/month",
            workload.kind(),
            workload.name(),
            prediction.monthly_cost_total
        );

        rows.push(demand.into_row(workload, prediction));
    }

    let currency_code = match query_currency_code(backend).await {
        Ok(code) => code,
        Err(e) => {
            debug!("failed to get currency code, displaying as empty string: {}", e);
            String::new()
        }
    };

    Ok(PredictionReport {
        rows,
        currency_code,
    })
}
