// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Port the cost-analyzer service and its pods listen on
pub const SERVICE_PORT: u16 = 9090;

/// Defaults used when neither the environment nor flags say otherwise
pub mod defaults {
    pub const NAMESPACE: &str = "kubecost";
    pub const SERVICE_NAME: &str = "kubecost-cost-analyzer";
    /// Upper bound for a single query, tunnel readiness included
    pub const TIMEOUT_SECS: u64 = 30;
}

/// Cost-model HTTP endpoints, relative to the service root
pub mod endpoints {
    pub const AGGREGATED_COST_MODEL: &str = "model/aggregatedCostModel";
    pub const PREDICT_RESOURCE_COST: &str = "model/prediction/resourcecost";
    pub const CURRENCY_CODE: &str = "model/currencyCode";
}

/// Extended resource names under which device plugins expose GPUs.
/// GPUs are only ever set as limits.
pub mod gpu {
    pub const AMD: &str = "amd.com/gpu";
    pub const INTEL: &str = "gpu.intel.com/i915";
    pub const NVIDIA: &str = "nvidia.com/gpu";

    pub const VENDOR_KEYS: [&str; 3] = [AMD, INTEL, NVIDIA];
}

/// Storage class reported for claims that don't name one
pub const UNKNOWN_STORAGE_CLASS: &str = "???-costctl-predict-unknown";
