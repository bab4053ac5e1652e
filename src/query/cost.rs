// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::backend::QueryBackend;
use super::decode::decode_map;
use super::model::Aggregation;
use super::params::QueryParams;
use crate::constants::endpoints;
use crate::error::{DecodeError, TransportError};
use std::collections::HashMap;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggCostModelParams {
    pub window: String,
    /// Field to aggregate by, e.g. `namespace`, `cluster`, `label`
    pub aggregate: String,
    pub aggregation_subfield: Option<String>,
}

impl AggCostModelParams {
    fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("window", &self.window)
            .with("aggregation", &self.aggregate)
            .with("rate", "monthly")
            .with("etl", "true")
            .with_opt("aggregationSubfield", self.aggregation_subfield.as_deref())
    }
}

/// Monthly-rate cost per aggregation bucket from `/model/aggregatedCostModel`.
/// A malformed response still yields every bucket that could be decoded,
/// alongside the decode error.
#[instrument(skip(backend))]
pub async fn query_agg_cost_model(
    backend: &QueryBackend,
    params: &AggCostModelParams,
) -> Result<(HashMap<String, Aggregation>, Option<DecodeError>), TransportError> {
    let raw = backend
        .query(endpoints::AGGREGATED_COST_MODEL, &params.to_query())
        .await?;
    Ok(decode_map(endpoints::AGGREGATED_COST_MODEL, &raw))
}
