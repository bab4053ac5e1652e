// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cost-model API queries: transport, parameters, decoding and result models.

pub mod backend;
pub mod cost;
pub mod decode;
pub mod model;
pub mod params;
pub mod predict;

pub use backend::{QueryBackend, Transport};
pub use cost::{query_agg_cost_model, AggCostModelParams};
pub use model::{Aggregation, ResourceCostPrediction, Vector};
pub use params::QueryParams;
pub use predict::{query_currency_code, query_predict_resource_cost};
