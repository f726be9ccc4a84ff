//! Boundary between raw store rows and canonical records.

use campaign_core::{DashboardError, DashboardResult};
use campaign_store::Collection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub fn decode<T: DeserializeOwned>(collection: Collection, row: Value) -> DashboardResult<T> {
    serde_json::from_value(row).map_err(|e| DashboardError::Decode(format!("{collection}: {e}")))
}

pub fn decode_all<T: DeserializeOwned>(collection: Collection, rows: Vec<Value>) -> DashboardResult<Vec<T>> {
    rows.into_iter().map(|r| decode(collection, r)).collect()
}

/// First decoded row, or `NotFound` when the call matched nothing.
pub fn decode_first<T: DeserializeOwned>(
    collection: Collection,
    entity: &'static str,
    id: impl ToString,
    rows: Vec<Value>,
) -> DashboardResult<T> {
    match rows.into_iter().next() {
        Some(row) => decode(collection, row),
        None => Err(DashboardError::not_found(entity, id)),
    }
}

pub fn encode<T: Serialize>(record: &T) -> DashboardResult<Value> {
    Ok(serde_json::to_value(record)?)
}
