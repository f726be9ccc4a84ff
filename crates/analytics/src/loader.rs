//! Read the analytics collection and denormalize it into display rows.

use campaign_core::types::AnalyticsRow;
use campaign_core::{DashboardError, DashboardResult};
use campaign_store::{Collection, Filter, RecordStore};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Name used when a row's campaign, ad group or ad cannot be resolved.
pub const UNKNOWN: &str = "Unknown";

type NameIndex = HashMap<String, String>;

async fn name_index(store: &dyn RecordStore, collection: Collection) -> DashboardResult<NameIndex> {
    let rows = store.select(collection, &Filter::All).await?;
    Ok(rows
        .iter()
        .filter_map(|r| Some((text(r.get("id")?)?, text(r.get("name")?)?)))
        .collect())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers may arrive as JSON numbers or numeric strings; anything else is 0.
fn metric(row: &Value, field: &str) -> f64 {
    match row.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Prefer an inline name, then the referenced record's name, then [`UNKNOWN`].
fn resolve(row: &Value, name_field: &str, id_field: &str, index: &NameIndex) -> String {
    row.get(name_field)
        .and_then(text)
        .or_else(|| {
            row.get(id_field)
                .and_then(text)
                .and_then(|id| index.get(&id).cloned())
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn to_row(raw: &Value, campaigns: &NameIndex, groups: &NameIndex, ads: &NameIndex) -> AnalyticsRow {
    AnalyticsRow {
        id: raw
            .get("id")
            .and_then(text)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        campaign: resolve(raw, "campaign", "campaign_id", campaigns),
        ad_group: resolve(raw, "adGroup", "ads_group_id", groups),
        ad: resolve(raw, "ad", "ad_id", ads),
        clicks: metric(raw, "clicks"),
        impressions: metric(raw, "impressions"),
        ctr: metric(raw, "ctr"),
        cost: metric(raw, "cost"),
        conversions: metric(raw, "conversions"),
        revenue: metric(raw, "revenue"),
    }
}

/// Load at most `limit` analytics rows with names resolved. A store with no
/// analytics collection yields no rows.
pub async fn load_rows(store: &dyn RecordStore, limit: usize) -> DashboardResult<Vec<AnalyticsRow>> {
    let raw = match store
        .select_limited(Collection::Analytics, &Filter::All, limit)
        .await
    {
        Ok(raw) => raw,
        Err(DashboardError::MissingCollection(name)) => {
            warn!(collection = %name, "Analytics collection does not exist, returning no rows");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let campaigns = name_index(store, Collection::Campaigns).await?;
    let groups = name_index(store, Collection::AdsGroups).await?;
    let ads = name_index(store, Collection::Ads).await?;

    let rows: Vec<AnalyticsRow> = raw
        .iter()
        .map(|r| to_row(r, &campaigns, &groups, &ads))
        .collect();

    debug!(limit, loaded = rows.len(), "Loaded analytics rows");
    metrics::counter!("analytics.rows_loaded").increment(rows.len() as u64);
    Ok(rows)
}
