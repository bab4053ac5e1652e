// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Table output for predictions and aggregated costs.

use crate::predict::PredictionReport;
use crate::query::Aggregation;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use std::collections::HashMap;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn header(columns: &[String]) -> Vec<Cell> {
    columns
        .iter()
        .map(|col| Cell::new(col).add_attribute(Attribute::Bold))
        .collect()
}

fn cost(value: f64) -> Cell {
    Cell::new(format!("{:.2}", value)).set_alignment(CellAlignment::Right)
}

fn with_currency(label: &str, currency_code: &str) -> String {
    if currency_code.is_empty() {
        label.to_string()
    } else {
        format!("{} ({})", label, currency_code)
    }
}

/// Render one row per predicted workload plus a total row.
/// Unit prices are shown per GiB for memory and storage.
pub fn prediction_table(report: &PredictionReport, show_cost_per_resource_hr: bool) -> String {
    let currency = report.currency_code.as_str();
    let mut columns: Vec<String> = ["Workload", "Kind", "CPU", "Memory", "GPU", "Storage"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    if show_cost_per_resource_hr {
        columns.extend([
            with_currency("CPU/core-hr", currency),
            with_currency("Memory/GiB-hr", currency),
            with_currency("GPU/hr", currency),
            with_currency("Storage/GiB-hr", currency),
        ]);
    }
    columns.extend([
        with_currency("CPU/mo", currency),
        with_currency("Memory/mo", currency),
        with_currency("GPU/mo", currency),
        with_currency("Storage/mo", currency),
        with_currency("Total/mo", currency),
    ]);

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&columns));

    let mut total = 0.0;
    for row in &report.rows {
        let p = &row.prediction;
        total += p.monthly_cost_total;

        let storage = match (&row.storage, &row.storage_class) {
            (Some(size), Some(class)) => format!("{} ({})", size, class),
            (Some(size), None) => size.clone(),
            _ => "0".to_string(),
        };
        let mut cells = vec![
            Cell::new(&row.name),
            Cell::new(&row.kind),
            Cell::new(&row.cpu),
            Cell::new(&row.memory),
            Cell::new(&row.gpu),
            Cell::new(storage),
        ];
        if show_cost_per_resource_hr {
            cells.extend([
                Cell::new(format!("{:.4}", p.derived_cost_per_cpu_core_hour)),
                Cell::new(format!("{:.4}", p.derived_cost_per_byte_hour * BYTES_PER_GIB)),
                Cell::new(format!("{:.4}", p.derived_cost_per_gpu_hour)),
                Cell::new(format!("{:.4}", p.derived_cost_per_storage_byte_hour * BYTES_PER_GIB)),
            ]);
        }
        cells.extend([
            cost(p.monthly_cost_cpu),
            cost(p.monthly_cost_memory),
            cost(p.monthly_cost_gpu),
            cost(p.monthly_cost_storage),
            cost(p.monthly_cost_total),
        ]);
        table.add_row(cells);
    }

    let mut footer = vec![Cell::new("Total").add_attribute(Attribute::Bold)];
    footer.extend((1..columns.len() - 1).map(|_| Cell::new("")));
    footer.push(cost(total).add_attribute(Attribute::Bold));
    table.add_row(footer);

    table.to_string()
}

/// Render aggregated monthly costs, one row per bucket, sorted by label
pub fn aggregation_table(data: &HashMap<String, Aggregation>, currency_code: &str) -> String {
    if data.is_empty() {
        return "(empty)".to_string();
    }

    let columns: Vec<String> = ["Name", "CPU", "GPU", "RAM", "PV", "Network", "Shared", "Total"]
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { c.to_string() } else { with_currency(c, currency_code) })
        .collect();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&columns));

    let mut labels: Vec<&String> = data.keys().collect();
    labels.sort();
    for label in labels {
        let agg = &data[label];
        table.add_row(vec![
            Cell::new(label),
            cost(agg.cpu_cost),
            cost(agg.gpu_cost),
            cost(agg.ram_cost),
            cost(agg.pv_cost),
            cost(agg.network_cost),
            cost(agg.shared_cost),
            cost(agg.total_cost),
        ]);
    }

    table.to_string()
}
