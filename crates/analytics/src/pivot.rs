//! Group analytics rows by a chosen set of dimensions, summing metrics.

use crate::columns::{Dimension, Metric};
use campaign_core::types::AnalyticsRow;
use std::collections::HashMap;

/// Aggregate `rows` over `dimensions`.
///
/// With no dimensions the rows come back unchanged. Otherwise each distinct
/// combination of dimension values yields one row: a copy of the first row
/// seen for that combination, with every metric summed across the group.
/// Output follows first-seen order.
pub fn pivot(rows: &[AnalyticsRow], dimensions: &[Dimension]) -> Vec<AnalyticsRow> {
    if dimensions.is_empty() {
        return rows.to_vec();
    }

    let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut out: Vec<AnalyticsRow> = Vec::new();

    for row in rows {
        let key: Vec<&str> = dimensions.iter().map(|d| d.value(row)).collect();
        match index.get(&key) {
            Some(&slot) => {
                let acc = &mut out[slot];
                for metric in Metric::ALL {
                    *metric.value_mut(acc) += metric.value(row);
                }
            }
            None => {
                index.insert(key, out.len());
                out.push(row.clone());
            }
        }
    }

    out
}
