//! Analytics table columns: dimensions and metrics, with visibility and ordering.

use campaign_core::types::AnalyticsRow;
use serde::{Deserialize, Serialize};

/// String-valued column that rows can be grouped by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Campaign,
    AdGroup,
    Ad,
}

/// Numeric column, summed when rows are grouped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Clicks,
    Impressions,
    Ctr,
    Cost,
    Conversions,
    Revenue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(untagged)]
pub enum Column {
    Dimension(Dimension),
    Metric(Metric),
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Campaign, Dimension::AdGroup, Dimension::Ad];

    pub fn value(self, row: &AnalyticsRow) -> &str {
        match self {
            Dimension::Campaign => &row.campaign,
            Dimension::AdGroup => &row.ad_group,
            Dimension::Ad => &row.ad,
        }
    }
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Clicks,
        Metric::Impressions,
        Metric::Ctr,
        Metric::Cost,
        Metric::Conversions,
        Metric::Revenue,
    ];

    pub fn value(self, row: &AnalyticsRow) -> f64 {
        match self {
            Metric::Clicks => row.clicks,
            Metric::Impressions => row.impressions,
            Metric::Ctr => row.ctr,
            Metric::Cost => row.cost,
            Metric::Conversions => row.conversions,
            Metric::Revenue => row.revenue,
        }
    }

    pub fn value_mut(self, row: &mut AnalyticsRow) -> &mut f64 {
        match self {
            Metric::Clicks => &mut row.clicks,
            Metric::Impressions => &mut row.impressions,
            Metric::Ctr => &mut row.ctr,
            Metric::Cost => &mut row.cost,
            Metric::Conversions => &mut row.conversions,
            Metric::Revenue => &mut row.revenue,
        }
    }
}

impl From<Dimension> for Column {
    fn from(d: Dimension) -> Self {
        Column::Dimension(d)
    }
}

impl From<Metric> for Column {
    fn from(m: Metric) -> Self {
        Column::Metric(m)
    }
}

impl Column {
    /// Natural definition order: dimensions first, then metrics.
    pub const ALL: [Column; 9] = [
        Column::Dimension(Dimension::Campaign),
        Column::Dimension(Dimension::AdGroup),
        Column::Dimension(Dimension::Ad),
        Column::Metric(Metric::Clicks),
        Column::Metric(Metric::Impressions),
        Column::Metric(Metric::Ctr),
        Column::Metric(Metric::Cost),
        Column::Metric(Metric::Conversions),
        Column::Metric(Metric::Revenue),
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Dimension(Dimension::Campaign) => "Campaign",
            Column::Dimension(Dimension::AdGroup) => "Ad Group",
            Column::Dimension(Dimension::Ad) => "Ad",
            Column::Metric(Metric::Clicks) => "Clicks",
            Column::Metric(Metric::Impressions) => "Impressions",
            Column::Metric(Metric::Ctr) => "CTR (%)",
            Column::Metric(Metric::Cost) => "Cost ($)",
            Column::Metric(Metric::Conversions) => "Conversions",
            Column::Metric(Metric::Revenue) => "Revenue ($)",
        }
    }
}

/// Columns shown for a pivot: everything when not pivoting, otherwise the
/// pivot dimensions in their chosen order followed by every metric.
pub fn display_columns(pivot: &[Dimension]) -> Vec<Column> {
    if pivot.is_empty() {
        return Column::ALL.to_vec();
    }
    pivot
        .iter()
        .copied()
        .map(Column::from)
        .chain(Metric::ALL.iter().copied().map(Column::from))
        .collect()
}

/// User-controlled column visibility and drag order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnLayout {
    /// Columns toggled off. Everything else is visible.
    #[serde(default)]
    pub hidden: Vec<Column>,
    /// Explicit order; empty means natural order.
    #[serde(default)]
    pub order: Vec<Column>,
}

impl ColumnLayout {
    pub fn is_visible(&self, column: Column) -> bool {
        !self.hidden.contains(&column)
    }

    pub fn set_visible(&mut self, column: Column, visible: bool) {
        self.hidden.retain(|c| *c != column);
        if !visible {
            self.hidden.push(column);
        }
    }

    pub fn toggle(&mut self, column: Column) {
        let visible = self.is_visible(column);
        self.set_visible(column, !visible);
    }

    /// `columns` rearranged by the explicit order. Columns missing from the
    /// order keep their relative position at the end.
    pub fn ordered(&self, columns: &[Column]) -> Vec<Column> {
        if self.order.is_empty() {
            return columns.to_vec();
        }
        let mut out: Vec<Column> = self
            .order
            .iter()
            .copied()
            .filter(|c| columns.contains(c))
            .collect();
        out.extend(columns.iter().copied().filter(|c| !self.order.contains(c)));
        out
    }

    /// Move `dragged` to where `target` sits. `current` is the column set on
    /// screen, used as the starting order when none has been set yet.
    pub fn reorder(&mut self, current: &[Column], dragged: Column, target: Column) {
        let mut order = if self.order.is_empty() {
            current.to_vec()
        } else {
            self.order.clone()
        };
        let (Some(from), Some(to)) = (
            order.iter().position(|c| *c == dragged),
            order.iter().position(|c| *c == target),
        ) else {
            return;
        };
        order.remove(from);
        order.insert(to.min(order.len()), dragged);
        self.order = order;
    }

    /// Visible columns for a pivot, in display order.
    pub fn visible_columns(&self, pivot: &[Dimension]) -> Vec<Column> {
        self.ordered(&display_columns(pivot))
            .into_iter()
            .filter(|c| self.is_visible(*c))
            .collect()
    }
}
