// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Requested-resource totals for a replicated set of pods

use super::quantity::{Format, Quantity};
use crate::constants::gpu;
use crate::error::QuantityError;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;
use std::collections::BTreeMap;

/// CPU and memory summed over every replica of a workload, and the GPUs
/// one replica asks for. `gpu` is `None` when no container asks for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTotals {
    pub cpu: Quantity,
    pub memory: Quantity,
    pub gpu: Option<Quantity>,
}

fn add_entry(
    total: &mut Quantity,
    list: Option<&BTreeMap<String, K8sQuantity>>,
    key: &str,
) -> Result<(), QuantityError> {
    if let Some(value) = list.and_then(|l| l.get(key)) {
        *total += Quantity::try_from(value)?;
    }
    Ok(())
}

/// `value` added to itself `times` times, by doubling.
/// Addition keeps the notation rules of Quantity intact.
fn repeat_add(value: Quantity, times: u32, format: Format) -> Quantity {
    let mut total = Quantity::zero(format);
    let mut step = value;
    let mut remaining = times;
    while remaining > 0 {
        if remaining & 1 == 1 {
            total += step;
        }
        remaining >>= 1;
        if remaining > 0 {
            let doubled = step;
            step += doubled;
        }
    }
    total
}

/// Sum CPU and memory requests and vendor GPU limits across `containers`,
/// then scale CPU and memory by `replicas`. GPU stays per pod.
pub fn sum_container_resources(
    replicas: u32,
    containers: &[Container],
) -> Result<ResourceTotals, QuantityError> {
    let mut pod_cpu = Quantity::zero(Format::DecimalSI);
    let mut pod_memory = Quantity::zero(Format::BinarySI);
    let mut pod_gpu = Quantity::zero(Format::DecimalSI);

    for container in containers {
        let resources = container.resources.as_ref();
        let requests = resources.and_then(|r| r.requests.as_ref());
        let limits = resources.and_then(|r| r.limits.as_ref());

        add_entry(&mut pod_cpu, requests, "cpu")?;
        add_entry(&mut pod_memory, requests, "memory")?;
        for key in gpu::VENDOR_KEYS {
            add_entry(&mut pod_gpu, limits, key)?;
        }
    }

    Ok(ResourceTotals {
        cpu: repeat_add(pod_cpu, replicas, Format::DecimalSI),
        memory: repeat_add(pod_memory, replicas, Format::BinarySI),
        gpu: (!pod_gpu.is_zero()).then_some(pod_gpu),
    })
}
