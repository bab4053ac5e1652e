// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod manifest;
pub mod pipeline;

pub use manifest::{decode_workloads, Workload};
pub use pipeline::{classify, predict_workloads, Demand, PredictOptions, PredictionReport, WorkloadRow};
