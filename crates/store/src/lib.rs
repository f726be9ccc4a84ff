//! Record store abstraction for the dashboard's three entity collections
//! plus the read-only analytics collection.
//!
//! Rows travel as JSON objects; callers resolve them into canonical types.
//! The backend is chosen once at startup and injected as `Arc<dyn RecordStore>`.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use campaign_core::config::{StoreBackend, StoreConfig};
use campaign_core::DashboardResult;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Named record collections on the hosted service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Campaigns,
    AdsGroups,
    Ads,
    Analytics,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Campaigns,
        Collection::AdsGroups,
        Collection::Ads,
        Collection::Analytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Campaigns => "campaigns",
            Collection::AdsGroups => "ads_groups",
            Collection::Ads => "ads",
            Collection::Analytics => "analytics",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row selector, by primary key or foreign key.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    /// Field equals value; a `null` value matches null or missing fields.
    Eq(String, Value),
    /// Field equals any of the values. An empty list matches nothing.
    In(String, Vec<Value>),
}

impl Filter {
    pub fn id(id: Uuid) -> Self {
        Self::eq_id("id", id)
    }

    pub fn eq_id(field: &str, id: Uuid) -> Self {
        Filter::Eq(field.to_string(), Value::String(id.to_string()))
    }

    pub fn is_null(field: &str) -> Self {
        Filter::Eq(field.to_string(), Value::Null)
    }

    pub fn in_ids(field: &str, ids: &[Uuid]) -> Self {
        Filter::In(
            field.to_string(),
            ids.iter().map(|id| Value::String(id.to_string())).collect(),
        )
    }

    /// Evaluate against a row held in memory.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, Value::Null) => row.get(field).map_or(true, Value::is_null),
            Filter::Eq(field, expected) => row.get(field) == Some(expected),
            Filter::In(field, values) => row
                .get(field)
                .map_or(false, |v| !v.is_null() && values.contains(v)),
        }
    }
}

/// CRUD access to the record collections.
///
/// Every call is a single round-trip. Nothing here retries or groups calls
/// into a transaction; errors come back as `DashboardError::Storage`, or
/// `MissingCollection` when the collection does not exist at all.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Insert one row and return it as stored.
    async fn insert(&self, collection: Collection, row: Value) -> DashboardResult<Value>;

    async fn select(&self, collection: Collection, filter: &Filter) -> DashboardResult<Vec<Value>>;

    /// Like `select`, but returns at most `limit` rows. Backends that can cap
    /// the result set server-side should override this.
    async fn select_limited(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> DashboardResult<Vec<Value>> {
        let mut rows = self.select(collection, filter).await?;
        rows.truncate(limit);
        Ok(rows)
    }

    /// Shallow-merge `patch` into every matching row; returns the updated rows.
    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Value,
    ) -> DashboardResult<Vec<Value>>;

    /// Delete every matching row; returns how many were removed.
    async fn delete(&self, collection: Collection, filter: &Filter) -> DashboardResult<u64>;
}

/// Build the configured backend.
pub fn from_config(config: &StoreConfig) -> DashboardResult<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let store = match &config.seed_file {
                Some(path) => MemoryStore::from_seed_file(path)?,
                None => MemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Rest => Ok(Arc::new(RestStore::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_null_matches_missing_and_null() {
        let filter = Filter::is_null("campaign_id");
        assert!(filter.matches(&json!({"id": "a"})));
        assert!(filter.matches(&json!({"id": "a", "campaign_id": null})));
        assert!(!filter.matches(&json!({"id": "a", "campaign_id": "c1"})));
    }

    #[test]
    fn test_in_filter() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let filter = Filter::in_ids("id", &[a]);
        assert!(filter.matches(&json!({"id": a.to_string()})));
        assert!(!filter.matches(&json!({"id": b.to_string()})));
        assert!(!Filter::in_ids("id", &[]).matches(&json!({"id": a.to_string()})));
    }

    #[test]
    fn test_collection_names() {
        let names: Vec<&str> = Collection::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["campaigns", "ads_groups", "ads", "analytics"]);
    }

    #[test]
    fn test_from_config_memory() {
        let store = from_config(&StoreConfig::default()).unwrap();
        assert_eq!(store.backend(), "memory");
    }
}
