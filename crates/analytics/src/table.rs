//! Filtering, multi-column sorting and pagination over pivoted rows.

use crate::columns::{Column, ColumnLayout, Dimension, Metric};
use crate::pivot::pivot;
use campaign_core::types::AnalyticsRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortKey {
    pub column: Column,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnFilter {
    /// Keep rows whose value is one of `values`; an empty selection keeps all.
    Values { column: Dimension, values: Vec<String> },
    /// Inclusive numeric range; either bound may be left open.
    Range {
        column: Metric,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

impl ColumnFilter {
    pub fn matches(&self, row: &AnalyticsRow) -> bool {
        match self {
            ColumnFilter::Values { column, values } => {
                values.is_empty() || values.iter().any(|v| v == column.value(row))
            }
            ColumnFilter::Range { column, min, max } => {
                let value = column.value(row);
                min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
            }
        }
    }
}

fn compare(a: &AnalyticsRow, b: &AnalyticsRow, key: &SortKey) -> Ordering {
    let ord = match key.column {
        Column::Dimension(d) => d.value(a).cmp(d.value(b)),
        Column::Metric(m) => m.value(a).total_cmp(&m.value(b)),
    };
    if key.descending {
        ord.reverse()
    } else {
        ord
    }
}

/// Stable multi-column sort: later keys break ties left by earlier ones.
pub fn sort_rows(rows: &mut [AnalyticsRow], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        keys.iter()
            .map(|k| compare(a, b, k))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

pub fn filter_rows(rows: Vec<AnalyticsRow>, filters: &[ColumnFilter]) -> Vec<AnalyticsRow> {
    if filters.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|r| filters.iter().all(|f| f.matches(r)))
        .collect()
}

/// Sorted distinct values of a dimension, for multi-select filter options.
pub fn facet_values(rows: &[AnalyticsRow], dimension: Dimension) -> Vec<String> {
    rows.iter()
        .map(|r| dimension.value(r).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Everything the analytics table needs to render one view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableQuery {
    #[serde(default)]
    pub pivot: Vec<Dimension>,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub filters: Vec<ColumnFilter>,
    #[serde(default)]
    pub layout: ColumnLayout,
    /// Zero-based page index.
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnInfo {
    pub id: Column,
    pub header: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableView {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<AnalyticsRow>,
    /// Rows left after filtering, across all pages.
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
}

/// Pivot, filter, sort, then cut out the requested page.
pub fn build_table(rows: &[AnalyticsRow], query: &TableQuery, default_page_size: usize) -> TableView {
    let mut rows = filter_rows(pivot(rows, &query.pivot), &query.filters);
    sort_rows(&mut rows, &query.sort);

    let page_size = query.page_size.unwrap_or(default_page_size).max(1);
    let total_rows = rows.len();
    let page_count = total_rows.div_ceil(page_size);
    let page_rows = rows
        .into_iter()
        .skip(query.page.saturating_mul(page_size))
        .take(page_size)
        .collect();

    let columns = query
        .layout
        .visible_columns(&query.pivot)
        .into_iter()
        .map(|id| ColumnInfo {
            id,
            header: id.header(),
        })
        .collect();

    TableView {
        columns,
        rows: page_rows,
        total_rows,
        page: query.page,
        page_size,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(campaign: &str, ad_group: &str, clicks: f64, cost: f64) -> AnalyticsRow {
        AnalyticsRow {
            id: format!("{campaign}-{ad_group}"),
            campaign: campaign.into(),
            ad_group: ad_group.into(),
            ad: "Unknown".into(),
            clicks,
            impressions: 100.0,
            ctr: clicks / 100.0,
            cost,
            conversions: 0.0,
            revenue: 0.0,
        }
    }

    fn sample() -> Vec<AnalyticsRow> {
        vec![
            row("B", "G1", 3.0, 10.0),
            row("A", "G2", 8.0, 5.0),
            row("A", "G1", 5.0, 7.0),
            row("C", "G3", 5.0, 1.0),
        ]
    }

    fn range(metric: Metric, min: Option<f64>, max: Option<f64>) -> ColumnFilter {
        ColumnFilter::Range {
            column: metric,
            min,
            max,
        }
    }

    #[test]
    fn test_open_upper_bound() {
        let kept = filter_rows(sample(), &[range(Metric::Clicks, Some(5.0), None)]);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| r.clicks >= 5.0));
    }

    #[test]
    fn test_closed_range_is_inclusive() {
        let kept = filter_rows(sample(), &[range(Metric::Cost, Some(5.0), Some(7.0))]);
        let costs: Vec<f64> = kept.iter().map(|r| r.cost).collect();
        assert_eq!(costs, vec![5.0, 7.0]);
        assert_eq!(filter_rows(sample(), &[range(Metric::Cost, None, None)]).len(), 4);
    }

    #[test]
    fn test_value_filter() {
        let only_a = ColumnFilter::Values {
            column: Dimension::Campaign,
            values: vec!["A".into(), "C".into()],
        };
        assert_eq!(filter_rows(sample(), &[only_a]).len(), 3);

        let nothing_selected = ColumnFilter::Values {
            column: Dimension::Campaign,
            values: vec![],
        };
        assert_eq!(filter_rows(sample(), &[nothing_selected]).len(), 4);
    }

    #[test]
    fn test_multi_column_sort() {
        let mut rows = sample();
        sort_rows(
            &mut rows,
            &[
                SortKey {
                    column: Column::Metric(Metric::Clicks),
                    descending: true,
                },
                SortKey {
                    column: Column::Dimension(Dimension::Campaign),
                    descending: false,
                },
            ],
        );
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A-G2", "A-G1", "C-G3", "B-G1"]);
    }

    #[test]
    fn test_facets() {
        assert_eq!(facet_values(&sample(), Dimension::Campaign), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_build_table_pivot_filter_sort_page() {
        let query: TableQuery = serde_json::from_value(json!({
            "pivot": ["campaign"],
            "sort": [{"column": "clicks", "descending": true}],
            "filters": [{"kind": "range", "column": "clicks", "min": 4}],
            "page": 0,
            "page_size": 1
        }))
        .unwrap();
        let view = build_table(&sample(), &query, 10);

        assert_eq!(view.total_rows, 2);
        assert_eq!(view.page_count, 2);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].campaign, "A");
        assert_eq!(view.rows[0].clicks, 13.0);
        assert_eq!(view.columns[0].header, "Campaign");
        assert_eq!(view.columns.len(), 7);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let query = TableQuery {
            page: 5,
            ..Default::default()
        };
        let view = build_table(&sample(), &query, 10);
        assert!(view.rows.is_empty());
        assert_eq!(view.total_rows, 4);
        assert_eq!(view.page_count, 1);
    }
}
