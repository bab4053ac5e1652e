// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Result models returned by the cost-model API

use serde::{Deserialize, Serialize};

/// Every cost-model response wraps its payload in this envelope
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Option<T>,
}

/// One sample of a cost time series
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    pub timestamp: f64,
    pub value: f64,
}

/// Cost figures for one aggregation bucket (a namespace, cluster, label value...)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Aggregation {
    #[serde(rename = "aggregation")]
    pub aggregator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfields: Option<Vec<String>>,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    #[serde(rename = "cpuAllocationAverage")]
    pub cpu_allocation_hourly_average: f64,
    #[serde(rename = "cpuCost")]
    pub cpu_cost: f64,
    #[serde(rename = "cpuCostVector", skip_serializing_if = "Option::is_none")]
    pub cpu_cost_vector: Option<Vec<Vector>>,
    #[serde(rename = "cpuEfficiency")]
    pub cpu_efficiency: f64,

    pub efficiency: f64,

    #[serde(rename = "gpuAllocationAverage")]
    pub gpu_allocation_hourly_average: f64,
    #[serde(rename = "gpuCost")]
    pub gpu_cost: f64,
    #[serde(rename = "gpuCostVector", skip_serializing_if = "Option::is_none")]
    pub gpu_cost_vector: Option<Vec<Vector>>,

    #[serde(rename = "ramAllocationAverage")]
    pub ram_allocation_hourly_average: f64,
    #[serde(rename = "ramCost")]
    pub ram_cost: f64,
    #[serde(rename = "ramCostVector", skip_serializing_if = "Option::is_none")]
    pub ram_cost_vector: Option<Vec<Vector>>,
    #[serde(rename = "ramEfficiency")]
    pub ram_efficiency: f64,

    #[serde(rename = "pvAllocationAverage")]
    pub pv_allocation_hourly_average: f64,
    #[serde(rename = "pvCost")]
    pub pv_cost: f64,
    #[serde(rename = "pvCostVector", skip_serializing_if = "Option::is_none")]
    pub pv_cost_vector: Option<Vec<Vector>>,

    #[serde(rename = "networkCost")]
    pub network_cost: f64,
    #[serde(rename = "networkCostVector", skip_serializing_if = "Option::is_none")]
    pub network_cost_vector: Option<Vec<Vector>>,

    #[serde(rename = "sharedCost")]
    pub shared_cost: f64,

    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    #[serde(rename = "totalCostVector", skip_serializing_if = "Option::is_none")]
    pub total_cost_vector: Option<Vec<Vector>>,
}

/// Predicted monthly cost of one workload, with the unit prices it was derived from
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceCostPrediction {
    #[serde(rename = "derivedCostPerCPUCoreHour")]
    pub derived_cost_per_cpu_core_hour: f64,
    pub derived_cost_per_byte_hour: f64,
    #[serde(rename = "derivedCostPerGPUHour")]
    pub derived_cost_per_gpu_hour: f64,
    pub derived_cost_per_storage_byte_hour: f64,

    #[serde(rename = "monthlyCostCPU")]
    pub monthly_cost_cpu: f64,
    pub monthly_cost_memory: f64,
    #[serde(rename = "monthlyCostGPU")]
    pub monthly_cost_gpu: f64,
    pub monthly_cost_storage: f64,
    pub monthly_cost_total: f64,
}
