// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource quantity arithmetic and per-workload totals.

pub mod quantity;
pub mod totals;

pub use quantity::{Format, Quantity};
pub use totals::{sum_container_resources, ResourceTotals};
