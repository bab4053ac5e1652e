// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::backend::QueryBackend;
use super::decode::decode;
use super::model::ResourceCostPrediction;
use super::params::QueryParams;
use crate::constants::endpoints;
use crate::error::Result;
use tracing::instrument;

/// Predicted monthly cost for the requested resources in `params`
#[instrument(skip(backend))]
pub async fn query_predict_resource_cost(
    backend: &QueryBackend,
    params: &QueryParams,
) -> Result<ResourceCostPrediction> {
    let raw = backend
        .query(endpoints::PREDICT_RESOURCE_COST, params)
        .await?;
    match decode(endpoints::PREDICT_RESOURCE_COST, &raw) {
        (prediction, None) => Ok(prediction),
        (_, Some(err)) => Err(err.into()),
    }
}

/// ISO currency code the cost-model reports prices in
#[instrument(skip(backend))]
pub async fn query_currency_code(backend: &QueryBackend) -> Result<String> {
    let raw = backend
        .query(endpoints::CURRENCY_CODE, &QueryParams::new())
        .await?;
    match decode(endpoints::CURRENCY_CODE, &raw) {
        (code, None) => Ok(code),
        (_, Some(err)) => Err(err.into()),
    }
}
